//! Step command queue.
//!
//! A fixed-capacity single-producer/single-consumer ring of [`StepCommand`]s.
//! The ramp generator (foreground) pushes, the compare interrupt pops.

mod command;
mod ring;

pub use command::{StepCommand, ABSOLUTE_MAX_TICKS};
pub use ring::{Pending, QueueConsumer, QueueProducer, StepQueue, DEFAULT_QUEUE_LEN};
