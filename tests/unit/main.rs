//! Unit test harness for stepper-pulse.
//!
//! Configuration tests that go through the public TOML entry points.

mod config_parsing;
mod config_validation;
