//! Channel pool and interrupt consumer.
//!
//! [`StepperEngine::new`] splits one queue per channel: the engine keeps the
//! producers and hands motors out by [`StepperId`], while the returned
//! [`PulseGenerator`] holds the consumers for the compare interrupt.

mod handle;
mod led;
mod pulse;
mod registry;

pub use handle::Stepper;
pub use led::DebugLed;
pub use pulse::{PulseEvent, PulseGenerator};
pub use registry::StepperEngine;

/// Handle of a connected motor: its pulse channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepperId(pub(crate) u8);

impl StepperId {
    /// Pulse channel this motor is bound to.
    #[inline]
    pub fn channel(self) -> u8 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        usize::from(self.0)
    }
}
