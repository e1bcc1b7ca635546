//! Unit tests for configuration validation.

use stepper_pulse::config::{validate_config, SystemConfig};
use stepper_pulse::error::{ConfigError, Error};

fn config(toml_str: &str) -> SystemConfig {
    toml::from_str(toml_str).expect("Failed to parse TOML")
}

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let config = config(
        r#"
[platform]
kind = "avr"

[motors.x]
step_pin = 10
dir_pin = 7
enable_pin = 8
min_step_us = 100
acceleration = 4000

[motors.y]
step_pin = 9
dir_pin = 6
min_step_us = 100
acceleration = 4000
"#,
    );
    assert!(validate_config(&config).is_ok());
}

/// Test that zero speed or acceleration is rejected.
#[test]
fn test_zero_rates_rejected() {
    let zero_speed = config(
        r#"
[motors.x]
step_pin = 2
min_step_us = 0
acceleration = 4000
"#,
    );
    assert_eq!(
        validate_config(&zero_speed),
        Err(Error::Config(ConfigError::InvalidSpeed(0)))
    );

    let zero_accel = config(
        r#"
[motors.x]
step_pin = 2
min_step_us = 100
acceleration = 0
"#,
    );
    assert_eq!(
        validate_config(&zero_accel),
        Err(Error::Config(ConfigError::InvalidAcceleration(0)))
    );
}

/// Test that AVR only accepts its compare output pins for stepping.
#[test]
fn test_avr_step_pin_rejected() {
    let config = config(
        r#"
[platform]
kind = "avr"

[motors.x]
step_pin = 3
min_step_us = 100
acceleration = 4000
"#,
    );
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::UnsupportedStepPin(3)))
    );
}

/// Test that ESP32 flash pins cannot step.
#[test]
fn test_esp32_flash_pin_rejected() {
    let config = config(
        r#"
[platform]
kind = "esp32"

[motors.x]
step_pin = 7
min_step_us = 100
acceleration = 4000
"#,
    );
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::UnsupportedStepPin(7)))
    );
}

/// Test that a pin shared between motors is rejected.
#[test]
fn test_shared_pin_rejected() {
    let config = config(
        r#"
[motors.x]
step_pin = 2
dir_pin = 5
min_step_us = 100
acceleration = 4000

[motors.y]
step_pin = 3
dir_pin = 5
min_step_us = 100
acceleration = 4000
"#,
    );
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::DuplicatePin(5)))
    );
}

/// Test that more motors than channels is rejected.
#[test]
fn test_too_many_motors() {
    let config = config(
        r#"
[motors.a]
step_pin = 2
min_step_us = 100
acceleration = 4000

[motors.b]
step_pin = 3
min_step_us = 100
acceleration = 4000

[motors.c]
step_pin = 4
min_step_us = 100
acceleration = 4000
"#,
    );
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::TooManyMotors {
            configured: 3,
            available: 2,
        }))
    );
}
