//! Queue entry: one timed burst of same-direction, same-interval pulses.

use crate::error::QueueError;

/// Largest start delta a single entry can carry, in ticks.
///
/// Product of the 8-bit prescale and 16-bit compare fields the hardware
/// timers program per entry.
pub const ABSOLUTE_MAX_TICKS: u32 = 255 * 65_535;

/// One queue entry.
///
/// `direction_high` is the logical direction: high counts the position up.
/// A motor configured with inverted direction gets the opposite pin level.
///
/// `steps` pulses are emitted, each `start_delta_ticks` after the previous
/// event. A `steps` of zero marks a pause produced by the ramp generator for
/// intervals longer than [`ABSOLUTE_MAX_TICKS`]; the low-level API never
/// accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepCommand {
    start_delta_ticks: u32,
    steps: u8,
    direction_high: bool,
}

impl StepCommand {
    /// Placeholder used to initialize ring slots.
    pub(crate) const EMPTY: Self = Self {
        start_delta_ticks: 0,
        steps: 0,
        direction_high: false,
    };

    /// Validate and build an entry.
    ///
    /// # Errors
    ///
    /// - [`QueueError::StepsError`] if `steps == 0`
    /// - [`QueueError::DeltaTooHigh`] if `start_delta_ticks > ABSOLUTE_MAX_TICKS`
    /// - [`QueueError::DeltaTooLow`] if `start_delta_ticks < min_delta_ticks`
    pub fn new(
        start_delta_ticks: u32,
        steps: u8,
        direction_high: bool,
        min_delta_ticks: u32,
    ) -> Result<Self, QueueError> {
        if steps == 0 {
            return Err(QueueError::StepsError);
        }
        if start_delta_ticks > ABSOLUTE_MAX_TICKS {
            return Err(QueueError::DeltaTooHigh);
        }
        if start_delta_ticks < min_delta_ticks {
            return Err(QueueError::DeltaTooLow);
        }
        Ok(Self {
            start_delta_ticks,
            steps,
            direction_high,
        })
    }

    /// Entry built by the ramp generator, which clamps its own intervals.
    pub(crate) const fn planned(start_delta_ticks: u32, steps: u8, direction_high: bool) -> Self {
        Self {
            start_delta_ticks,
            steps,
            direction_high,
        }
    }

    /// A delay with no pulses.
    pub(crate) const fn pause(ticks: u32, direction_high: bool) -> Self {
        Self {
            start_delta_ticks: ticks,
            steps: 0,
            direction_high,
        }
    }

    /// Ticks until the first pulse (and between subsequent pulses).
    #[inline]
    pub fn start_delta_ticks(&self) -> u32 {
        self.start_delta_ticks
    }

    /// Number of pulses.
    #[inline]
    pub fn steps(&self) -> u8 {
        self.steps
    }

    /// True if the entry counts the position up.
    #[inline]
    pub fn direction_high(&self) -> bool {
        self.direction_high
    }

    /// True for generator pauses.
    #[inline]
    pub fn is_pause(&self) -> bool {
        self.steps == 0
    }

    /// Signed position change once the entry has run.
    #[inline]
    pub fn position_delta(&self) -> i32 {
        if self.direction_high {
            i32::from(self.steps)
        } else {
            -i32::from(self.steps)
        }
    }

    /// Total ticks the entry occupies the channel.
    #[inline]
    pub fn duration_ticks(&self) -> u64 {
        u64::from(self.start_delta_ticks) * u64::from(self.steps.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: u32 = 320;

    #[test]
    fn test_boundaries() {
        assert!(StepCommand::new(MIN, 1, true, MIN).is_ok());
        assert!(StepCommand::new(ABSOLUTE_MAX_TICKS, 255, true, MIN).is_ok());
        assert_eq!(StepCommand::new(MIN - 1, 1, true, MIN), Err(QueueError::DeltaTooLow));
        assert_eq!(
            StepCommand::new(ABSOLUTE_MAX_TICKS + 1, 1, true, MIN),
            Err(QueueError::DeltaTooHigh)
        );
        assert_eq!(StepCommand::new(MIN, 0, true, MIN), Err(QueueError::StepsError));
    }

    #[test]
    fn test_position_delta() {
        let fwd = StepCommand::planned(1000, 7, true);
        let back = StepCommand::planned(1000, 7, false);
        assert_eq!(fwd.position_delta(), 7);
        assert_eq!(back.position_delta(), -7);
        assert_eq!(StepCommand::pause(1000, true).position_delta(), 0);
    }

    #[test]
    fn test_duration() {
        assert_eq!(StepCommand::planned(1000, 3, true).duration_ticks(), 3000);
        assert_eq!(StepCommand::pause(ABSOLUTE_MAX_TICKS, true).duration_ticks(), 16_711_425);
    }
}
