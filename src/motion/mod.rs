//! Motion planning for stepper-pulse.
//!
//! Turns a target position plus speed and acceleration into timed step
//! entries, one at a time, using fixed-point arithmetic only.

mod profile;
mod ramp;
mod scalar;
mod state;

pub use profile::{Direction, RampProfile};
pub use ramp::{PlannedStep, RampGenerator, RampParameters};
pub use scalar::FixedScalar;
pub use state::RampState;
