//! Target platform description: tick rate, channel count and step-pin map.

use serde::Deserialize;

use super::units::TickRate;

/// Static capacity of the engine's controller arena.
pub const MAX_STEPPER: usize = 6;

/// AVR step pin on timer 1 compare output A.
pub const AVR_STEP_PIN_A: u8 = 9;
/// AVR step pin on timer 1 compare output B.
pub const AVR_STEP_PIN_B: u8 = 10;

/// Supported platform families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    /// ATmega328-class: one 16-bit timer with two compare outputs.
    Avr,
    /// ESP32: two MCPWM units with three timers each.
    Esp32,
    /// Host simulation.
    #[default]
    Host,
}

/// Timer and pin capabilities of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Platform {
    kind: PlatformKind,
    tick_rate: TickRate,
}

impl Platform {
    /// AVR, ticking at the CPU clock.
    pub fn avr(tick_rate: TickRate) -> Self {
        Self {
            kind: PlatformKind::Avr,
            tick_rate,
        }
    }

    /// ESP32 with the MCPWM timers at 16 MHz.
    pub fn esp32() -> Self {
        Self {
            kind: PlatformKind::Esp32,
            tick_rate: TickRate::MHZ_16,
        }
    }

    /// Host simulation at 16 MHz.
    pub fn host() -> Self {
        Self {
            kind: PlatformKind::Host,
            tick_rate: TickRate::MHZ_16,
        }
    }

    /// Same family with a different tick rate.
    pub fn with_tick_rate(self, tick_rate: TickRate) -> Self {
        Self { tick_rate, ..self }
    }

    /// Platform family.
    #[inline]
    pub fn kind(&self) -> PlatformKind {
        self.kind
    }

    /// Timer frequency.
    #[inline]
    pub fn tick_rate(&self) -> TickRate {
        self.tick_rate
    }

    /// Timer frequency in Hz.
    #[inline]
    pub fn ticks_per_second(&self) -> u32 {
        self.tick_rate.value()
    }

    /// Shortest delta a queue entry may carry: 20 µs worth of ticks.
    #[inline]
    pub fn min_delta_ticks(&self) -> u32 {
        self.tick_rate.value() / 50_000
    }

    /// Number of pulse channels.
    pub fn max_steppers(&self) -> usize {
        match self.kind {
            PlatformKind::Avr => 2,
            PlatformKind::Esp32 => 6,
            PlatformKind::Host => 2,
        }
    }

    /// True if `pin` can carry step pulses.
    pub fn is_valid_step_pin(&self, pin: u8) -> bool {
        match self.kind {
            PlatformKind::Avr => self.fixed_channel(pin).is_some(),
            PlatformKind::Esp32 => {
                pin <= 33 && !(6..=11).contains(&pin) && !matches!(pin, 20 | 24 | 28..=31)
            }
            PlatformKind::Host => pin < 64,
        }
    }

    /// Channel hard-wired to `pin`, for platforms with fixed compare outputs.
    ///
    /// `None` on platforms where any free channel can be routed to any valid
    /// pin.
    pub fn fixed_channel(&self, pin: u8) -> Option<usize> {
        match (self.kind, pin) {
            (PlatformKind::Avr, AVR_STEP_PIN_B) => Some(0),
            (PlatformKind::Avr, AVR_STEP_PIN_A) => Some(1),
            _ => None,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}

/// `[platform]` table.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PlatformConfig {
    /// Platform family.
    #[serde(default)]
    pub kind: PlatformKind,

    /// Tick rate override; required for AVR boards not clocked at 16 MHz.
    #[serde(default)]
    pub ticks_per_second: Option<TickRate>,
}

impl PlatformConfig {
    /// Build the platform description.
    pub fn platform(&self) -> Platform {
        let base = match self.kind {
            PlatformKind::Avr => Platform::avr(TickRate::MHZ_16),
            PlatformKind::Esp32 => Platform::esp32(),
            PlatformKind::Host => Platform::host(),
        };
        match self.ticks_per_second {
            Some(rate) => base.with_tick_rate(rate),
            None => base,
        }
    }
}
