//! Ground-line detection.
//!
//! Ground sensors are indexed by physical placement: `gs0` is the rightmost sensor
//! and `gs2` the leftmost. The centre sensor is sampled but does not vote.

use serde::Serialize;

use super::{SensorFrame, GROUND_COUNT};
use crate::utils::error::ControllerError;

/// Which side of the robot currently sees the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LineSignal {
    pub line_left: bool,
    pub line_right: bool,
}

impl LineSignal {
    pub const fn new(
        line_left: bool,
        line_right: bool,
    ) -> Self {
        Self {
            line_left,
            line_right,
        }
    }

    /// Line seen on the right sensor only.
    pub fn right_only(&self) -> bool {
        self.line_right && !self.line_left
    }

    /// Line seen on the left sensor only.
    pub fn left_only(&self) -> bool {
        self.line_left && !self.line_right
    }
}

/// Stateless threshold comparator over the ground readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineDetector {
    threshold: f32,
}

impl LineDetector {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Derive the line signal from a complete frame.
    pub fn detect_frame(
        &self,
        frame: &SensorFrame,
    ) -> LineSignal {
        self.classify(frame.ground())
    }

    /// Derive the line signal from raw ground readings.
    ///
    /// Fails with `InvalidFrame` unless exactly three readings are given.
    pub fn detect(
        &self,
        ground: &[f32],
    ) -> Result<LineSignal, ControllerError> {
        let ground: &[f32; GROUND_COUNT] =
            ground
                .try_into()
                .map_err(|_| ControllerError::InvalidFrame {
                    expected: GROUND_COUNT,
                    found: ground.len(),
                })?;
        Ok(self.classify(ground))
    }

    fn classify(
        &self,
        ground: &[f32; GROUND_COUNT],
    ) -> LineSignal {
        LineSignal {
            line_left: ground[2] > self.threshold,
            line_right: ground[0] > self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_mapping() {
        let det = LineDetector::new(600.0);
        let sig = det.detect(&[800.0, 0.0, 100.0]).unwrap();
        assert_eq!(sig, LineSignal::new(false, true));
        assert!(sig.right_only());

        let sig = det.detect(&[100.0, 0.0, 800.0]).unwrap();
        assert_eq!(sig, LineSignal::new(true, false));
        assert!(sig.left_only());
    }

    #[test]
    fn test_threshold_is_strict() {
        let det = LineDetector::new(600.0);
        let sig = det.detect(&[600.0, 900.0, 600.0]).unwrap();
        assert_eq!(sig, LineSignal::default());
    }

    #[test]
    fn test_centre_sensor_ignored() {
        let det = LineDetector::new(600.0);
        let frame = SensorFrame::new(0, [0.0; 8], [0.0, 1000.0, 0.0]);
        assert_eq!(det.detect_frame(&frame), LineSignal::default());
    }

    #[test]
    fn test_wrong_length() {
        let det = LineDetector::new(600.0);
        assert!(matches!(
            det.detect(&[1.0, 2.0, 3.0, 4.0]),
            Err(ControllerError::InvalidFrame {
                expected: 3,
                found: 4
            })
        ));
    }
}
