//! Sensor frame acquisition.
//!
//! A `SensorFrame` is one synchronous sample of all eight proximity sensors and all
//! three ground sensors. Device access goes through the `SensorSource` capability so
//! the controller runs the same on hardware, in a simulator, or under test.

pub mod line;

use core::fmt;

use serde::Serialize;

use crate::utils::error::ControllerError;

/// Number of outward-facing proximity sensors (`ps0`..`ps7`).
pub const PROXIMITY_COUNT: usize = 8;
/// Number of downward-facing ground sensors (`gs0`..`gs2`).
pub const GROUND_COUNT: usize = 3;

/// Device-level access to the robot's sensors.
///
/// Reads must be bounded and non-blocking; the controller calls every index once per tick.
pub trait SensorSource {
    type Error: fmt::Debug;

    /// Read proximity sensor `index` (0..8).
    fn read_proximity(
        &mut self,
        index: usize,
    ) -> Result<f32, Self::Error>;

    /// Read ground sensor `index` (0..3). Index 0 is the rightmost sensor.
    fn read_ground(
        &mut self,
        index: usize,
    ) -> Result<f32, Self::Error>;
}

/// Why a device read was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorFaultKind<E> {
    /// The driver reported an error.
    Device(E),
    /// The driver returned a negative or non-finite intensity.
    OutOfRange(f32),
}

/// A failed read. Recoverable: the tick is skipped and the last command held.
///
/// `device_index` is 0..=7 for `ps0`..`ps7` and 8..=10 for `gs0`..`gs2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFault<E> {
    pub device_index: usize,
    pub kind: SensorFaultKind<E>,
}

impl<E: fmt::Debug> fmt::Display for SensorFault<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.kind {
            SensorFaultKind::Device(e) => {
                write!(f, "sensor {} read failed: {:?}", self.device_index, e)
            }
            SensorFaultKind::OutOfRange(v) => {
                write!(f, "sensor {} returned out-of-range value {}", self.device_index, v)
            }
        }
    }
}

/// One immutable snapshot of every sensor, taken on a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorFrame {
    tick: u64,
    proximity: [f32; PROXIMITY_COUNT],
    ground: [f32; GROUND_COUNT],
}

impl SensorFrame {
    pub const fn new(
        tick: u64,
        proximity: [f32; PROXIMITY_COUNT],
        ground: [f32; GROUND_COUNT],
    ) -> Self {
        Self {
            tick,
            proximity,
            ground,
        }
    }

    /// Build a frame from untyped slices, rejecting wrong lengths.
    pub fn from_slices(
        tick: u64,
        proximity: &[f32],
        ground: &[f32],
    ) -> Result<Self, ControllerError> {
        let proximity: [f32; PROXIMITY_COUNT] =
            proximity
                .try_into()
                .map_err(|_| ControllerError::InvalidFrame {
                    expected: PROXIMITY_COUNT,
                    found: proximity.len(),
                })?;
        let ground: [f32; GROUND_COUNT] =
            ground
                .try_into()
                .map_err(|_| ControllerError::InvalidFrame {
                    expected: GROUND_COUNT,
                    found: ground.len(),
                })?;
        Ok(Self::new(tick, proximity, ground))
    }

    /// Tick index the frame was captured on.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn proximity(&self) -> &[f32; PROXIMITY_COUNT] {
        &self.proximity
    }

    pub fn ground(&self) -> &[f32; GROUND_COUNT] {
        &self.ground
    }
}

/// Sample all eleven devices into a frame.
///
/// Either every device is read or the call fails; partial frames are never returned.
pub fn read_frame<S: SensorSource>(
    source: &mut S,
    tick: u64,
) -> Result<SensorFrame, SensorFault<S::Error>> {
    let mut proximity = [0.0; PROXIMITY_COUNT];
    for (i, slot) in proximity.iter_mut().enumerate() {
        *slot = checked(i, source.read_proximity(i))?;
    }

    let mut ground = [0.0; GROUND_COUNT];
    for (i, slot) in ground.iter_mut().enumerate() {
        *slot = checked(PROXIMITY_COUNT + i, source.read_ground(i))?;
    }

    Ok(SensorFrame::new(tick, proximity, ground))
}

fn checked<E>(
    device_index: usize,
    reading: Result<f32, E>,
) -> Result<f32, SensorFault<E>> {
    match reading {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Ok(v) => Err(SensorFault {
            device_index,
            kind: SensorFaultKind::OutOfRange(v),
        }),
        Err(e) => Err(SensorFault {
            device_index,
            kind: SensorFaultKind::Device(e),
        }),
    }
}
