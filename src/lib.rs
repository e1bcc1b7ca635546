//! # stepper-pulse
//!
//! Interrupt-driven stepper pulse generation for embedded targets.
//!
//! ## Features
//!
//! - **Lock-free step queue**: a single-producer/single-consumer ring shared
//!   between foreground code and the timer compare interrupt
//! - **Trapezoidal ramps**: fixed-point ramp generator planning one queue
//!   entry at a time, with retargeting and controlled stops mid-move
//! - **Channel pool**: motors are bound to hardware pulse channels by step pin
//! - **no_std compatible**: no allocation, no floating point in the motion path
//! - **Configuration-driven**: motors and platform described in TOML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_pulse::{Platform, StepQueue, StepperEngine};
//!
//! let mut queues: [StepQueue<32>; 2] = [StepQueue::new(), StepQueue::new()];
//! let (mut engine, mut pulses) = StepperEngine::new(Platform::host(), board, &mut queues);
//!
//! let id = engine.stepper_connect_to_pin(10).unwrap();
//! let mut stepper = engine.stepper(id).unwrap();
//! stepper.set_direction_pin(11)?;
//! stepper.set_speed(100);         // µs between steps at full speed
//! stepper.set_acceleration(1000); // steps/s²
//! stepper.move_to(1000)?;
//!
//! // in the compare interrupt:
//! pulses.on_compare_interrupt(&mut timer, channel);
//!
//! // in the main loop:
//! engine.manage_steppers()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod hal;
pub mod motion;
pub mod motor;
pub mod queue;

// Re-exports for ergonomic API
pub use config::{validate_config, MotorConfig, Platform, PlatformKind, SystemConfig};
pub use engine::{PulseEvent, PulseGenerator, Stepper, StepperEngine, StepperId};
pub use error::{Error, QueueError, Result};
pub use hal::{Gpio, OutputPinBank, PinMode, PulseTimer, StepperHal};
pub use motion::{Direction, RampProfile, RampState};
pub use motor::MotorController;
pub use queue::{StepCommand, StepQueue, DEFAULT_QUEUE_LEN};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Microseconds, StepsPerSecSquared, TickRate, Ticks};
