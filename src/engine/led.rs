//! Heartbeat LED driven from `manage_steppers`.

use crate::error::Result;
use crate::hal::{Gpio, PinMode};

/// Toggles a pin every half second of ticks, giving a 1 Hz blink while
/// `manage_steppers` keeps being called.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebugLed {
    pin: u8,
    half_period: u32,
    last_toggle: u32,
    on: bool,
}

impl DebugLed {
    /// Configure `pin` as an output, switched off.
    pub fn new<H: Gpio>(hal: &mut H, pin: u8, ticks_per_second: u32, now: u32) -> Result<Self> {
        hal.set_pin_mode(pin, PinMode::Output)?;
        hal.set_pin_level(pin, false)?;
        Ok(Self {
            pin,
            half_period: (ticks_per_second / 2).max(1),
            last_toggle: now,
            on: false,
        })
    }

    /// LED pin.
    #[inline]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Current LED level.
    #[inline]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Toggle if half a period has passed since the last toggle.
    ///
    /// Returns true if the pin was written.
    pub fn update<H: Gpio>(&mut self, hal: &mut H, now: u32) -> Result<bool> {
        if now.wrapping_sub(self.last_toggle) < self.half_period {
            return Ok(false);
        }
        self.on = !self.on;
        self.last_toggle = now;
        hal.set_pin_level(self.pin, self.on)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::OutputPinBank;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as MockState, Transaction as PinTransaction,
    };

    #[test]
    fn test_blinks_at_half_period() {
        let expectations = [
            PinTransaction::set(MockState::Low),
            PinTransaction::set(MockState::High),
            PinTransaction::set(MockState::Low),
        ];
        let mut pin = PinMock::new(&expectations);
        let mut bank: OutputPinBank<PinMock, 1> = OutputPinBank::new();
        bank.add(13, pin.clone()).unwrap();

        let mut led = DebugLed::new(&mut bank, 13, 1000, 0).unwrap();
        assert!(!led.update(&mut bank, 499).unwrap());
        assert!(led.update(&mut bank, 500).unwrap());
        assert!(led.is_on());
        assert!(!led.update(&mut bank, 999).unwrap());
        assert!(led.update(&mut bank, 1000).unwrap());
        assert!(!led.is_on());

        pin.done();
    }

    #[test]
    fn test_tick_counter_wrap() {
        let mut pin = PinMock::new(&[
            PinTransaction::set(MockState::Low),
            PinTransaction::set(MockState::High),
        ]);
        let mut bank: OutputPinBank<PinMock, 1> = OutputPinBank::new();
        bank.add(2, pin.clone()).unwrap();

        let mut led = DebugLed::new(&mut bank, 2, 1000, u32::MAX - 100).unwrap();
        assert!(!led.update(&mut bank, u32::MAX).unwrap());
        assert!(led.update(&mut bank, 400).unwrap());

        pin.done();
    }
}
