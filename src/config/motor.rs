//! Motor configuration from TOML.

use serde::Deserialize;

use super::units::{Microseconds, StepsPerSecSquared};

/// Complete motor configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Pin carrying step pulses; selects the pulse channel.
    pub step_pin: u8,

    /// Direction pin, if the driver has one.
    #[serde(default)]
    pub dir_pin: Option<u8>,

    /// Driver enable pin.
    #[serde(default)]
    pub enable_pin: Option<u8>,

    /// Enable line is asserted low (the common driver convention).
    #[serde(default = "default_enable_active_low")]
    pub enable_active_low: bool,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Enable the driver before each move and disable it once idle.
    #[serde(default)]
    pub auto_enable: bool,

    /// Minimum step interval, which sets the maximum speed.
    #[serde(rename = "min_step_us")]
    pub min_step_interval: Microseconds,

    /// Acceleration and deceleration rate.
    pub acceleration: StepsPerSecSquared,
}

fn default_enable_active_low() -> bool {
    true
}

impl MotorConfig {
    /// Configuration with only the required fields set.
    pub fn new(
        step_pin: u8,
        min_step_interval: Microseconds,
        acceleration: StepsPerSecSquared,
    ) -> Self {
        Self {
            step_pin,
            dir_pin: None,
            enable_pin: None,
            enable_active_low: default_enable_active_low(),
            invert_direction: false,
            auto_enable: false,
            min_step_interval,
            acceleration,
        }
    }

    /// Maximum speed in steps per second.
    pub fn max_speed(&self) -> f32 {
        self.min_step_interval.steps_per_sec()
    }

    /// Every pin this motor claims.
    pub fn pins(&self) -> impl Iterator<Item = u8> {
        core::iter::once(self.step_pin)
            .chain(self.dir_pin)
            .chain(self.enable_pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pins_and_speed() {
        let mut config = MotorConfig::new(9, Microseconds(500), StepsPerSecSquared(4000));
        config.dir_pin = Some(7);
        config.enable_pin = Some(8);

        let pins: heapless::Vec<u8, 3> = config.pins().collect();
        assert_eq!(pins.as_slice(), &[9, 7, 8]);
        assert!((config.max_speed() - 2000.0).abs() < 0.01);
        assert!(config.enable_active_low);
    }
}
