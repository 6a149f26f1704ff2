//! Toy track simulation feeding the controller.
//!
//! The robot's lateral offset from the line drifts each tick and is pulled back by
//! the wheel speed difference. Ground sensors read bright when over the line.

use core::cell::RefCell;

use lfb_core::utils::{
    controllers::{ActuatorSink, Side},
    sensors::SensorSource,
};

const SENSOR_SPACING: f32 = 1.0;
const LINE_HALF_WIDTH: f32 = 0.6;
const LINE_READING: f32 = 900.0;
const FLOOR_READING: f32 = 300.0;
const AMBIENT_PROXIMITY: f32 = 65.0;
const STEER_GAIN: f32 = 0.1;

pub struct World {
    /// Positive means the robot sits left of the line.
    pub offset: f32,
    pub drift: f32,
    pub left: f32,
    pub right: f32,
    pub tick: u64,
    /// Drop a ground read every `fault_every` ticks (0 disables).
    pub fault_every: u64,
}

impl World {
    pub fn new(
        drift: f32,
        fault_every: u64,
    ) -> Self {
        Self {
            offset: 0.0,
            drift,
            left: 0.0,
            right: 0.0,
            tick: 0,
            fault_every,
        }
    }

    fn advance(&mut self) {
        self.tick += 1;
        self.offset += self.drift - (self.left - self.right) * STEER_GAIN;
    }

    fn ground(
        &self,
        index: usize,
    ) -> f32 {
        // gs0 is the rightmost sensor.
        let position = self.offset + (index as f32 - 1.0) * SENSOR_SPACING;
        if position.abs() < LINE_HALF_WIDTH {
            LINE_READING
        } else {
            FLOOR_READING
        }
    }

    fn dropout(&self) -> bool {
        self.fault_every != 0 && self.tick % self.fault_every == 0
    }
}

#[derive(Debug)]
pub enum SimError {
    Dropout,
}

pub struct TrackSensors {
    pub world: &'static RefCell<World>,
}

impl SensorSource for TrackSensors {
    type Error = SimError;

    fn read_proximity(
        &mut self,
        index: usize,
    ) -> Result<f32, SimError> {
        if index == 0 {
            self.world.borrow_mut().advance();
        }
        Ok(AMBIENT_PROXIMITY)
    }

    fn read_ground(
        &mut self,
        index: usize,
    ) -> Result<f32, SimError> {
        let world = self.world.borrow();
        if index == 1 && world.dropout() {
            return Err(SimError::Dropout);
        }
        Ok(world.ground(index))
    }
}

/// Motors that only update the simulation and log.
pub struct ConsoleMotors {
    pub world: &'static RefCell<World>,
}

impl ActuatorSink for ConsoleMotors {
    type Error = core::convert::Infallible;

    fn set_velocity(
        &mut self,
        side: Side,
        speed: f32,
    ) -> Result<(), Self::Error> {
        let mut world = self.world.borrow_mut();
        match side {
            Side::Left => world.left = speed,
            Side::Right => world.right = speed,
        }
        tracing::trace!(?side, speed, "motor");
        Ok(())
    }
}
