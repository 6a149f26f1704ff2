//! Controller tuning parameters.
//!
//! A `ControllerConfig` is built once, validated, and handed to the controller by
//! value. Nothing mutates it afterwards. Missing JSON keys fall back to the
//! e-puck defaults below.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::utils::error::ConfigError;

/// Wheel speeds of a turning state, as fractions of `max_speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedFractions {
    pub left: f32,
    pub right: f32,
}

impl SpeedFractions {
    pub const fn new(
        left: f32,
        right: f32,
    ) -> Self {
        Self { left, right }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for value in [self.left, self.right] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::SpeedFraction { value });
            }
        }
        Ok(())
    }
}

/// Immutable tuning parameters for one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Wheel speed limit (rad/s). Commands are clamped to `[-max_speed, max_speed]`.
    pub max_speed: f32,
    /// Ticks a turning state is held before returning to `Forward`.
    pub dwell_ticks_threshold: u32,
    /// Ground readings strictly above this value count as line.
    pub ground_line_threshold: f32,
    pub turn_right: SpeedFractions,
    pub turn_left: SpeedFractions,
    /// Period the host is expected to tick at (ms).
    pub tick_period_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_speed: 6.28,
            dwell_ticks_threshold: 5,
            ground_line_threshold: 600.0,
            turn_right: SpeedFractions::new(0.8, 0.4),
            turn_left: SpeedFractions::new(0.4, 0.8),
            tick_period_ms: 64,
        }
    }
}

impl ControllerConfig {
    /// Parse a (possibly partial) JSON document and validate the result.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: ControllerConfig = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(ConfigError::MaxSpeed(self.max_speed));
        }
        if self.dwell_ticks_threshold == 0 {
            return Err(ConfigError::DwellTicks);
        }
        if !self.ground_line_threshold.is_finite() {
            return Err(ConfigError::LineThreshold(self.ground_line_threshold));
        }
        self.turn_right.validate()?;
        self.turn_left.validate()?;
        if self.tick_period_ms == 0 {
            return Err(ConfigError::TickPeriod);
        }
        Ok(())
    }

    /// Scheduling period for the host loop.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_period(), Duration::from_millis(64));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ControllerConfig::from_json(br#"{"max_speed": 3.0, "dwell_ticks_threshold": 8}"#)
                .unwrap();
        assert_eq!(config.max_speed, 3.0);
        assert_eq!(config.dwell_ticks_threshold, 8);
        assert_eq!(config.ground_line_threshold, 600.0);
        assert_eq!(config.turn_left, SpeedFractions::new(0.4, 0.8));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_speed = ControllerConfig {
            max_speed: 0.0,
            ..Default::default()
        };
        assert!(matches!(bad_speed.validate(), Err(ConfigError::MaxSpeed(_))));

        let bad_dwell = ControllerConfig {
            dwell_ticks_threshold: 0,
            ..Default::default()
        };
        assert!(matches!(bad_dwell.validate(), Err(ConfigError::DwellTicks)));

        let bad_fraction = ControllerConfig {
            turn_right: SpeedFractions::new(1.2, 0.4),
            ..Default::default()
        };
        assert!(matches!(
            bad_fraction.validate(),
            Err(ConfigError::SpeedFraction { .. })
        ));

        let nan_threshold = ControllerConfig {
            ground_line_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan_threshold.validate(),
            Err(ConfigError::LineThreshold(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ControllerConfig::from_json(b"{max_speed"),
            Err(ConfigError::Parse(_))
        ));
    }
}
