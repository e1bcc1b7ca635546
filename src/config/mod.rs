//! Configuration module for stepper-pulse.
//!
//! Provides types for loading and validating platform and motor
//! configurations from TOML files (with `std` feature) or pre-parsed data.

mod motor;
mod platform;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use motor::MotorConfig;
pub use platform::{
    Platform, PlatformConfig, PlatformKind, AVR_STEP_PIN_A, AVR_STEP_PIN_B, MAX_STEPPER,
};
pub use system::SystemConfig;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Microseconds, StepsPerSecSquared, TickRate, Ticks};
