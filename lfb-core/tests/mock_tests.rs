use core::cell::RefCell;

use embedded_hal::i2c::ErrorKind;
use embedded_hal_bus::i2c::RefCellDevice;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};
use lfb_core::utils::{
    controllers::{ActuatorSink, PwmMotors, Side, PWM_ADDRESS},
    ConfigError,
};
use pwm_pca9685::{Address as PwmAddress, Pca9685};

/// Create a write transaction for the given I2C address and data payload.
pub fn write(
    addr: u8,
    data: Vec<u8>,
) -> I2cTrans {
    I2cTrans::write(addr, data)
}

fn attached(bus: &RefCell<I2cMock>) -> PwmMotors<'_, I2cMock> {
    let mut motors = PwmMotors::new(bus, 6.28).unwrap();
    let pwm = Pca9685::new(RefCellDevice::new(bus), PwmAddress::from(PWM_ADDRESS)).unwrap();
    motors.pwm = Some(pwm);
    motors
}

/// Enable, then prescale (includes sleep handling)
fn configure_transactions() -> Vec<I2cTrans> {
    vec![
        write(PWM_ADDRESS, vec![0x00, 0x01]),
        write(PWM_ADDRESS, vec![0x00, 0x11]),
        write(PWM_ADDRESS, vec![0xFE, 100]),
        write(PWM_ADDRESS, vec![0x00, 0x01]),
    ]
}

/// Every scanned address NACKs except `responding`.
fn scan_transactions(responding: u8) -> Vec<I2cTrans> {
    (0x03..0x78u8)
        .map(|addr| {
            let t = write(addr, vec![]);
            if addr == responding {
                t
            } else {
                t.with_error(ErrorKind::Other)
            }
        })
        .collect()
}

#[test]
fn test_init_devices_configures_pwm() {
    let mock = I2cMock::new(&configure_transactions());
    let i2c_bus = RefCell::new(mock);
    let mut motors = PwmMotors::new(&i2c_bus, 6.28).unwrap();
    motors.init_devices().unwrap();
    assert!(motors.pwm.is_some());
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_init_failure_scans_bus() {
    let mut expectations =
        vec![write(PWM_ADDRESS, vec![0x00, 0x01]).with_error(ErrorKind::Other)];
    expectations.extend(scan_transactions(0x68));

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut motors = PwmMotors::new(&i2c_bus, 6.28).unwrap();
    assert!(motors.init_devices().is_err());
    assert!(motors.pwm.is_none());
    assert!(motors.set_velocity(Side::Left, 1.0).is_err());
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_scan_bus_counts_responders() {
    let mock = I2cMock::new(&scan_transactions(PWM_ADDRESS));
    let i2c_bus = RefCell::new(mock);
    let motors = PwmMotors::new(&i2c_bus, 6.28).unwrap();
    assert_eq!(motors.scan_bus(), 1);
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_disable_then_enable() {
    // MODE1: sleep bit set, then cleared
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x11]),
        write(PWM_ADDRESS, vec![0x00, 0x01]),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut motors = attached(&i2c_bus);
    motors.disable().unwrap();
    motors.enable().unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_enable_without_device_is_noop() {
    let mock = I2cMock::new(&[]);
    let i2c_bus = RefCell::new(mock);
    let mut motors = PwmMotors::new(&i2c_bus, 6.28).unwrap();
    motors.disable().unwrap();
    motors.enable().unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_rejects_invalid_max_speed() {
    let mock = I2cMock::new(&[]);
    let i2c_bus = RefCell::new(mock);
    for limit in [0.0, -6.28, f32::NAN, f32::INFINITY] {
        assert!(matches!(
            PwmMotors::new(&i2c_bus, limit),
            Err(ConfigError::MaxSpeed(_))
        ));
    }
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_configure_pwm() {
    let mock = I2cMock::new(&configure_transactions());
    let i2c_bus = RefCell::new(mock);
    let mut motors = attached(&i2c_bus);
    motors.configure_pwm().unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_configure_without_device() {
    let mock = I2cMock::new(&[]);
    let i2c_bus = RefCell::new(mock);
    let mut motors = PwmMotors::new(&i2c_bus, 6.28).unwrap();
    assert!(motors.configure_pwm().is_err());
    assert!(motors.set_velocity(Side::Left, 1.0).is_err());
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_stop_both_wheels() {
    // One auto-increment write, then phase/enable for C0..C3
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x31]),
        write(PWM_ADDRESS, vec![0x06, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x0A, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x0E, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x12, 0x00, 0x00, 0x00, 0x00]),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut motors = attached(&i2c_bus);
    motors.set_velocity(Side::Left, 0.0).unwrap();
    motors.set_velocity(Side::Right, 0.0).unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_full_forward_and_half_reverse() {
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x31]),
        // left: forward phase, full duty
        write(PWM_ADDRESS, vec![0x06, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x0A, 0x00, 0x00, 0xFF, 0x0F]),
        // right: reverse phase, half duty (2047)
        write(PWM_ADDRESS, vec![0x0E, 0x00, 0x00, 0xFF, 0x0F]),
        write(PWM_ADDRESS, vec![0x12, 0x00, 0x00, 0xFF, 0x07]),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut motors = attached(&i2c_bus);
    motors.set_velocity(Side::Left, 6.28).unwrap();
    motors.set_velocity(Side::Right, -3.14).unwrap();
    i2c_bus.borrow_mut().done();
}
