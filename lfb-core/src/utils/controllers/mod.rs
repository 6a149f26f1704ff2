//! Module Exports
//!
//! Decision and actuation side of the controller.
//!
//! - `behavior`: the three-state line-following machine and its wheel commands.
//! - `motors`: actuator capability and the clamping command writer.
//! - `pwm`: PCA9685-backed motor pair over I2C.
//! - `driver`: the per-tick loop tying sensors, behavior and motors together.

pub mod behavior;
pub mod driver;
pub mod motors;
/// Module for driving the motors through a PCA9685 on I2C.
pub mod pwm;

pub use behavior::{BehaviorMachine, BehaviorState, Decision, WheelCommand};
pub use driver::{ControlLoop, LoopStats, TickOutcome, TickTrace};
pub use motors::{ActuatorFault, ActuatorSink, ActuatorWriter, Side};
pub use pwm::{DeviceError, PwmMotors, PWM_ADDRESS};
