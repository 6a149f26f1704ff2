//! Fatal errors for the line-following controller.
//!
//! Transient hardware faults live next to the component that absorbs them
//! (`SensorFault` in `sensors`, `ActuatorFault` in `controllers::motors`). The
//! types here signal contract or configuration violations and halt the controller.

use core::fmt;

/// Configuration rejected at construction time.
#[derive(Debug)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    Parse(serde_json::Error),
    /// `max_speed` must be finite and strictly positive.
    MaxSpeed(f32),
    /// `dwell_ticks_threshold` must be at least one tick.
    DwellTicks,
    /// `ground_line_threshold` must be finite.
    LineThreshold(f32),
    /// Turn speed fractions must lie in `[0, 1]`.
    SpeedFraction { value: f32 },
    /// `tick_period_ms` must be non-zero.
    TickPeriod,
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid config document: {}", e),
            ConfigError::MaxSpeed(v) => write!(f, "max_speed must be > 0, got {}", v),
            ConfigError::DwellTicks => f.write_str("dwell_ticks_threshold must be > 0"),
            ConfigError::LineThreshold(v) => {
                write!(f, "ground_line_threshold must be finite, got {}", v)
            }
            ConfigError::SpeedFraction { value } => {
                write!(f, "turn speed fraction must be within [0, 1], got {}", value)
            }
            ConfigError::TickPeriod => f.write_str("tick_period_ms must be > 0"),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that stop the controller.
#[derive(Debug)]
pub enum ControllerError {
    /// A sensor slice had the wrong number of readings.
    InvalidFrame { expected: usize, found: usize },
    /// The supplied configuration is unusable.
    Config(ConfigError),
}

impl fmt::Display for ControllerError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ControllerError::InvalidFrame { expected, found } => {
                write!(f, "invalid frame: expected {} readings, found {}", expected, found)
            }
            ControllerError::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl From<ConfigError> for ControllerError {
    fn from(e: ConfigError) -> Self {
        ControllerError::Config(e)
    }
}
