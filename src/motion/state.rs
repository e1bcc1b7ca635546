//! Ramp state reported per motor.

/// Where a motor is in its current move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampState {
    /// Queue empty and no move pending.
    #[default]
    Idle,
    /// Speeding up toward the configured maximum.
    Accelerate,
    /// Slowing down because `stop_move` was called; the target is discarded.
    DecelerateToStop,
    /// Slowing down to land on the target, or before a reversal.
    Decelerate,
    /// Holding maximum speed.
    Coast,
}

impl RampState {
    /// State name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            RampState::Idle => "Idle",
            RampState::Accelerate => "Accelerate",
            RampState::DecelerateToStop => "DecelerateToStop",
            RampState::Decelerate => "Decelerate",
            RampState::Coast => "Coast",
        }
    }

    /// Numeric code used on the wire by existing firmware front-ends.
    pub fn code(self) -> u8 {
        match self {
            RampState::Idle => 0,
            RampState::Accelerate => 1,
            RampState::DecelerateToStop => 2,
            RampState::Decelerate => 3,
            RampState::Coast => 4,
        }
    }

    /// True for either decelerating state.
    #[inline]
    pub fn is_decelerating(self) -> bool {
        matches!(self, RampState::Decelerate | RampState::DecelerateToStop)
    }
}

impl core::fmt::Display for RampState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
