//! PCA9685 motor driver for the two drive wheels.
//!
//! Each wheel is wired to an H-bridge with a phase (direction) input and an enable
//! (duty) input, both fed from PCA9685 channels on a shared I2C bus.

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use super::motors::{ActuatorSink, Side};
use crate::utils::error::ConfigError;

/// Default I2C address of the PWM controller.
pub const PWM_ADDRESS: u8 = 0x55;

const MAX_DUTY: u16 = 4095;

/// Errors that can occur when driving the motors.
#[derive(Debug)]
pub enum DeviceError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
    PwmNotInitialized,
}

/// Differential-drive motor pair behind a PCA9685.
pub struct PwmMotors<'a, I2C: 'static> {
    i2c: &'a RefCell<I2C>,
    pub pwm: Option<Pca9685<RefCellDevice<'a, I2C>>>,
    /// (phase, enable) channels for the left and right wheel.
    motor_channels: [(Channel, Channel); 2],
    max_speed: f32,
}

impl<'a, I2C, E> PwmMotors<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Create a motor pair whose full duty corresponds to `max_speed` (rad/s).
    ///
    /// `max_speed` must be finite and strictly positive.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        max_speed: f32,
    ) -> Result<Self, ConfigError> {
        if !max_speed.is_finite() || max_speed <= 0.0 {
            return Err(ConfigError::MaxSpeed(max_speed));
        }
        Ok(PwmMotors {
            i2c: i2c_bus,
            pwm: None,
            motor_channels: [(Channel::C0, Channel::C1), (Channel::C2, Channel::C3)],
            max_speed,
        })
    }

    /// Attach the PCA9685 at `PWM_ADDRESS` and configure it.
    ///
    /// If the chip does not answer, the bus is scanned for diagnostics and the
    /// driver is left detached.
    pub fn init_devices(&mut self) -> Result<(), DeviceError<E>> {
        let pwm = Pca9685::new(RefCellDevice::new(self.i2c), PwmAddress::from(PWM_ADDRESS))
            .map_err(DeviceError::PwmError)?;
        self.pwm = Some(pwm);

        if let Err(e) = self.configure_pwm() {
            tracing::warn!("PWM init failed, scanning instead: {:?}", e);
            self.pwm = None;
            self.scan_bus();
            return Err(e);
        }
        Ok(())
    }

    /// Probe every 7-bit address and log the ones that acknowledge.
    ///
    /// Returns how many devices answered.
    pub fn scan_bus(&self) -> usize {
        let mut bus = self.i2c.borrow_mut();
        let mut found = 0;
        for addr in 0x03..0x78u8 {
            if bus.write(addr, &[]).is_ok() {
                tracing::warn!(addr, "I2C device responded");
                found += 1;
            }
        }
        found
    }

    /// Enable the PWM outputs and set the prescaler.
    pub fn configure_pwm(&mut self) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.enable().map_err(DeviceError::PwmError)?;
        tracing::info!("PWM enabled");
        pca.set_prescale(100).map_err(DeviceError::PwmError)?;
        tracing::info!("PWM prescale set to 60Hz");
        Ok(())
    }

    /// Drive one wheel. Speeds beyond `max_speed` saturate at full duty.
    pub fn apply_wheel_speed(
        &mut self,
        side: Side,
        speed: f32,
    ) -> Result<(), DeviceError<E>> {
        let (phase_channel, enable_channel) = match side {
            Side::Left => self.motor_channels[0],
            Side::Right => self.motor_channels[1],
        };
        let speed = if speed.is_nan() { 0.0 } else { speed };
        let duty = if speed == 0.0 {
            0.0
        } else {
            (speed.abs() / self.max_speed).min(1.0)
        };
        let forward = speed >= 0.0;

        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.set_channel_on_off(phase_channel, 0, if forward { 0 } else { MAX_DUTY })
            .map_err(DeviceError::PwmError)?;
        pca.set_channel_on_off(enable_channel, 0, (duty * MAX_DUTY as f32) as u16)
            .map_err(DeviceError::PwmError)?;
        Ok(())
    }

    /// Re-enable PWM output after `disable`.
    pub fn enable(&mut self) -> Result<(), DeviceError<E>> {
        if let Some(pca) = self.pwm.as_mut() {
            pca.enable().map_err(DeviceError::PwmError)?;
        }
        Ok(())
    }

    /// Put the PWM controller to sleep; both motors coast.
    pub fn disable(&mut self) -> Result<(), DeviceError<E>> {
        if let Some(pca) = self.pwm.as_mut() {
            pca.disable().map_err(DeviceError::PwmError)?;
        }
        Ok(())
    }
}

impl<'a, I2C, E> ActuatorSink for PwmMotors<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    type Error = DeviceError<E>;

    fn set_velocity(
        &mut self,
        side: Side,
        speed: f32,
    ) -> Result<(), Self::Error> {
        self.apply_wheel_speed(side, speed)
    }
}
