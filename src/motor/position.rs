//! Position tracking for queue-driven motors.
//!
//! The producer only knows where the motor will be once everything queued
//! has run. The current position is derived from that by subtracting what
//! is still pending.

use crate::queue::StepCommand;

/// Motor position tracker.
///
/// Holds the position after all queued commands complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    /// Position once the queue drains, in steps.
    at_queue_end: i32,
}

impl Position {
    /// Create a position tracker at a specific position.
    #[inline]
    pub const fn at(steps: i32) -> Self {
        Self { at_queue_end: steps }
    }

    /// Position once every queued command has run.
    #[inline]
    pub fn at_queue_end(&self) -> i32 {
        self.at_queue_end
    }

    /// Position now, given the commands not yet taken by the consumer.
    ///
    /// The entry the consumer is currently executing has already left the
    /// queue, so while it runs this leads the motor by at most its remaining
    /// pulses.
    pub fn current<I>(&self, pending: I) -> i32
    where
        I: IntoIterator<Item = StepCommand>,
    {
        pending
            .into_iter()
            .fold(self.at_queue_end, |pos, cmd| {
                pos.wrapping_sub(cmd.position_delta())
            })
    }

    /// Account for a command that was just queued.
    #[inline]
    pub fn record(&mut self, command: &StepCommand) {
        self.at_queue_end = self.at_queue_end.wrapping_add(command.position_delta());
    }

    /// Shift the coordinate system by `offset` steps without moving.
    #[inline]
    pub fn shift(&mut self, offset: i32) {
        self.at_queue_end = self.at_queue_end.wrapping_add(offset);
    }

    /// Steps from the end of the queue to `target`.
    #[inline]
    pub fn steps_to(&self, target: i32) -> i64 {
        i64::from(target) - i64::from(self.at_queue_end)
    }
}
