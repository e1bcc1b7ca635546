//! Configuration validation.

use heapless::Vec;

use crate::error::{ConfigError, Error, Result};

use super::platform::{Platform, MAX_STEPPER};
use super::{MotorConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Motor count fits the platform's pulse channels
/// - Speed and acceleration are positive
/// - Step pins can drive a channel on this platform
/// - No pin is claimed twice
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    let platform = config.platform();

    let available = platform.max_steppers().min(MAX_STEPPER);
    if config.motors.len() > available {
        return Err(Error::Config(ConfigError::TooManyMotors {
            configured: config.motors.len(),
            available,
        }));
    }

    let mut claimed: Vec<u8, 24> = Vec::new();
    for (_name, motor) in config.motors.iter() {
        validate_motor(motor, &platform)?;

        for pin in motor.pins() {
            if claimed.contains(&pin) {
                return Err(Error::Config(ConfigError::DuplicatePin(pin)));
            }
            // at most three pins for each of at most eight motors
            let _ = claimed.push(pin);
        }
    }

    Ok(())
}

fn validate_motor(config: &MotorConfig, platform: &Platform) -> Result<()> {
    if config.min_step_interval.value() == 0 {
        return Err(Error::Config(ConfigError::InvalidSpeed(
            config.min_step_interval.value(),
        )));
    }

    if config.acceleration.value() == 0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration(
            config.acceleration.value(),
        )));
    }

    if !platform.is_valid_step_pin(config.step_pin) {
        return Err(Error::Config(ConfigError::UnsupportedStepPin(config.step_pin)));
    }

    Ok(())
}
