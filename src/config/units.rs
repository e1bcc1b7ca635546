//! Unit types for timing quantities.
//!
//! Speed is configured as a minimum step interval in microseconds and
//! executed as timer ticks; keeping both as distinct types prevents mixing
//! them up at call sites.

use serde::Deserialize;

use crate::error::ConfigError;

/// Duration in timer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticks(pub u32);

impl Ticks {
    /// Create a new Ticks value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Duration in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Microseconds(pub u32);

impl Microseconds {
    /// Create a new Microseconds value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Convert to ticks at the given tick rate, saturating at `u32::MAX`.
    #[inline]
    pub fn to_ticks(self, rate: TickRate) -> Ticks {
        let ticks = u64::from(self.0) * u64::from(rate.value()) / 1_000_000;
        Ticks(ticks.min(u64::from(u32::MAX)) as u32)
    }

    /// Step rate this interval corresponds to.
    #[inline]
    pub fn steps_per_sec(self) -> f32 {
        if self.0 == 0 {
            0.0
        } else {
            1_000_000.0 / self.0 as f32
        }
    }
}

/// Acceleration in steps per second squared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct StepsPerSecSquared(pub u32);

impl StepsPerSecSquared {
    /// Create a new StepsPerSecSquared value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Timer frequency in ticks per second.
///
/// Validated at construction: below 50 kHz the minimum pulse delta would be
/// zero ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickRate(u32);

impl TickRate {
    /// 16 MHz, the rate of every supported platform's default timer.
    pub const MHZ_16: Self = Self(16_000_000);

    /// Slowest accepted rate.
    pub const MIN: u32 = 50_000;

    /// Create a new TickRate value with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidTickRate` below 50 kHz.
    pub fn new(value: u32) -> Result<Self, ConfigError> {
        if value >= Self::MIN {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidTickRate(value))
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::MHZ_16
    }
}

impl TryFrom<u32> for TickRate {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for TickRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u32::deserialize(deserializer)?;
        TickRate::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate_validation() {
        assert!(TickRate::new(50_000).is_ok());
        assert!(TickRate::new(16_000_000).is_ok());
        assert_eq!(TickRate::new(49_999), Err(ConfigError::InvalidTickRate(49_999)));
        assert_eq!(TickRate::default().value(), 16_000_000);
    }

    #[test]
    fn test_micros_to_ticks() {
        assert_eq!(Microseconds(3162).to_ticks(TickRate::MHZ_16), Ticks(50_592));
        assert_eq!(Microseconds(u32::MAX).to_ticks(TickRate::MHZ_16), Ticks(u32::MAX));
        let slow = TickRate::new(50_000).unwrap();
        assert_eq!(Microseconds(19).to_ticks(slow), Ticks(0));
    }

    #[test]
    fn test_steps_per_sec() {
        assert!((Microseconds(1000).steps_per_sec() - 1000.0).abs() < 0.001);
        assert_eq!(Microseconds(0).steps_per_sec(), 0.0);
    }
}
