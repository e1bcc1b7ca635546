//! Unit tests for TOML configuration parsing.

use stepper_pulse::config::{load_config, parse_config, PlatformKind, SystemConfig};
use stepper_pulse::error::{ConfigError, Error};

/// Test parsing a fully specified motor.
#[test]
fn test_parse_motor_config() {
    let toml_str = r#"
[motors.x_axis]
step_pin = 10
dir_pin = 11
enable_pin = 12
enable_active_low = false
invert_direction = true
auto_enable = true
min_step_us = 250
acceleration = 8000
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let motor = config.motor("x_axis").expect("Motor not found");

    assert_eq!(motor.step_pin, 10);
    assert_eq!(motor.dir_pin, Some(11));
    assert_eq!(motor.enable_pin, Some(12));
    assert!(!motor.enable_active_low);
    assert!(motor.invert_direction);
    assert!(motor.auto_enable);
    assert_eq!(motor.min_step_interval.value(), 250);
    assert_eq!(motor.acceleration.value(), 8000);
    assert!((motor.max_speed() - 4000.0).abs() < 0.01);
}

/// Test that optional fields take their defaults.
#[test]
fn test_motor_defaults() {
    let toml_str = r#"
[motors.feeder]
step_pin = 5
min_step_us = 100
acceleration = 1000
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");
    let motor = config.motor("feeder").unwrap();

    assert_eq!(motor.dir_pin, None);
    assert_eq!(motor.enable_pin, None);
    assert!(motor.enable_active_low);
    assert!(!motor.invert_direction);
    assert!(!motor.auto_enable);
    assert_eq!(motor.pins().collect::<Vec<_>>(), [5]);
}

/// Test the platform table and its default.
#[test]
fn test_parse_platform() {
    let toml_str = r#"
[platform]
kind = "esp32"

[motors.a]
step_pin = 4
min_step_us = 100
acceleration = 1000
"#;

    let config = parse_config(toml_str).unwrap();
    assert_eq!(config.platform().kind(), PlatformKind::Esp32);
    assert_eq!(config.platform().max_steppers(), 6);
    assert_eq!(config.platform().ticks_per_second(), 16_000_000);

    let config = parse_config("").unwrap();
    assert_eq!(config.platform().kind(), PlatformKind::Host);
    assert_eq!(config.motor_names().count(), 0);
}

/// Test overriding the AVR tick rate.
#[test]
fn test_avr_tick_rate_override() {
    let toml_str = r#"
[platform]
kind = "avr"
ticks_per_second = 8000000
"#;

    let platform = parse_config(toml_str).unwrap().platform();
    assert_eq!(platform.ticks_per_second(), 8_000_000);
    assert_eq!(platform.min_delta_ticks(), 160);
}

/// Test that a missing required field is a parse error.
#[test]
fn test_missing_acceleration() {
    let toml_str = r#"
[motors.x_axis]
step_pin = 10
min_step_us = 100
"#;

    assert!(matches!(
        parse_config(toml_str),
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

/// Test that an unknown platform kind is rejected.
#[test]
fn test_unknown_platform_kind() {
    assert!(matches!(
        parse_config("[platform]\nkind = \"pic\"\n"),
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

/// Test loading from a file on disk.
#[test]
fn test_load_config_file() {
    let path = std::env::temp_dir().join("stepper_pulse_load_config.toml");
    std::fs::write(
        &path,
        "[motors.z]\nstep_pin = 9\nmin_step_us = 500\nacceleration = 2000\n",
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.motor("z").unwrap().step_pin, 9);
    std::fs::remove_file(&path).ok();

    assert!(matches!(
        load_config(std::env::temp_dir().join("stepper_pulse_missing.toml")),
        Err(Error::Config(ConfigError::IoError(_)))
    ));
}
