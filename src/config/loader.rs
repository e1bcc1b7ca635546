//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::SystemConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
///
/// ```rust,ignore
/// use stepper_pulse::load_config;
///
/// let config = load_config("steppers.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SystemConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = heapless::String::try_from(e.to_string().as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<SystemConfig> {
    let config: SystemConfig = toml::from_str(content).map_err(|e| {
        let msg = truncated(e.message());
        Error::Config(ConfigError::ParseError(msg))
    })?;

    super::validation::validate_config(&config)?;

    Ok(config)
}

/// Keep as much of `msg` as fits; toml messages can exceed the buffer.
fn truncated(msg: &str) -> heapless::String<128> {
    let mut out = heapless::String::new();
    for c in msg.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[motors.x_axis]
step_pin = 17
min_step_us = 100
acceleration = 4000
"#;

        let config = parse_config(toml).unwrap();
        let x = config.motor("x_axis").unwrap();
        assert_eq!(x.step_pin, 17);
        assert_eq!(x.dir_pin, None);
        assert!(x.enable_active_low);
    }

    #[test]
    fn test_parse_platform() {
        let toml = r#"
[platform]
kind = "avr"
ticks_per_second = 8000000

[motors.spindle]
step_pin = 10
dir_pin = 7
min_step_us = 250
acceleration = 2000
"#;

        let config = parse_config(toml).unwrap();
        let platform = config.platform();
        assert_eq!(platform.ticks_per_second(), 8_000_000);
        assert_eq!(platform.fixed_channel(10), Some(0));
    }

    #[test]
    fn test_parse_rejects_low_tick_rate() {
        let toml = r#"
[platform]
kind = "esp32"
ticks_per_second = 1000
"#;

        assert!(matches!(
            parse_config(toml),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_truncated_message() {
        let long = "x".repeat(300);
        assert_eq!(truncated(&long).len(), 128);
    }
}
