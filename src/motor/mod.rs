//! Motor module for stepper-pulse.
//!
//! Provides the per-axis controller that feeds a step queue from the ramp
//! generator, and position tracking across the queue.

mod controller;
mod position;

pub use controller::MotorController;
pub use position::Position;
