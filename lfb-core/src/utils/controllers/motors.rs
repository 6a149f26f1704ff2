//! Actuator command writer.
//!
//! Clamps wheel targets and forwards them to whatever drives the two motors.

use core::fmt;

use serde::Serialize;

use super::behavior::WheelCommand;

/// Drive wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Device-level access to the two drive motors.
pub trait ActuatorSink {
    type Error: fmt::Debug;

    /// Set the angular velocity target (rad/s) of one wheel.
    fn set_velocity(
        &mut self,
        side: Side,
        speed: f32,
    ) -> Result<(), Self::Error>;
}

/// A motor write that did not reach the device. Recoverable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorFault<E> {
    pub side: Side,
    pub error: E,
}

impl<E: fmt::Debug> fmt::Display for ActuatorFault<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} motor write failed: {:?}", self.side, self.error)
    }
}

/// Owns the motor sink and the speed limit it enforces.
pub struct ActuatorWriter<A> {
    sink: A,
    max_speed: f32,
}

impl<A: ActuatorSink> ActuatorWriter<A> {
    pub fn new(
        sink: A,
        max_speed: f32,
    ) -> Self {
        Self { sink, max_speed }
    }

    /// Clamp `command` and write left then right.
    ///
    /// Both sides are always attempted so one unreachable motor does not leave the
    /// other on a stale target. The first failing side is reported; the command is
    /// re-issued in full on the next tick.
    pub fn write(
        &mut self,
        command: WheelCommand,
    ) -> Result<WheelCommand, ActuatorFault<A::Error>> {
        let command = command.clamped(self.max_speed);
        let left = self.sink.set_velocity(Side::Left, command.left);
        let right = self.sink.set_velocity(Side::Right, command.right);

        left.map_err(|error| ActuatorFault {
            side: Side::Left,
            error,
        })?;
        right.map_err(|error| ActuatorFault {
            side: Side::Right,
            error,
        })?;
        Ok(command)
    }

    pub fn sink(&self) -> &A {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut A {
        &mut self.sink
    }

    pub fn into_inner(self) -> A {
        self.sink
    }
}
