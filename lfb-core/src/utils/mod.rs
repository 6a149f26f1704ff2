//! Utility re-exports for the line-following controller.
//!
//! Components are laid out in the order data flows through one tick:
//!
//! - `sensors`: frame acquisition and ground-line detection
//! - `controllers`: behavior state machine, actuator writer, PCA9685 motor sink and the loop driver
//! - `config`: immutable tuning parameters loaded at construction
//! - `error`: fatal configuration and contract errors

pub mod config;
pub mod controllers;
pub mod error;
pub mod sensors;

pub use config::{ControllerConfig, SpeedFractions};
pub use controllers::{BehaviorMachine, BehaviorState, ControlLoop, WheelCommand};
pub use error::{ConfigError, ControllerError};
pub use sensors::{line::LineDetector, line::LineSignal, SensorFrame, SensorSource};
