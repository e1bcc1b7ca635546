//! Collaborator interfaces.
//!
//! The engine never touches registers. Foreground code talks to a
//! [`StepperHal`]; the compare interrupt talks to a [`PulseTimer`]. Both are
//! implemented per board.

use embedded_hal::digital::{OutputPin, PinState};
use heapless::Vec;

use crate::error::{MotorError, Result};

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Push-pull output.
    Output,
    /// High-impedance input.
    Input,
}

/// Foreground GPIO access by pin number.
pub trait Gpio {
    /// Configure `pin`.
    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()>;

    /// Drive `pin` high or low.
    fn set_pin_level(&mut self, pin: u8, high: bool) -> Result<()>;
}

/// Foreground side of a board: GPIO plus pulse-channel control.
pub trait StepperHal: Gpio {
    /// Arm `channel`'s compare interrupt to fire promptly, starting the
    /// consumer on an idle channel.
    fn start_pulse_train(&mut self, channel: u8);

    /// Monotonic tick counter at the platform tick rate; wraps.
    fn ticks(&self) -> u32;
}

/// Interrupt side of a board. Every method must be callable from the
/// compare interrupt: bounded and non-blocking.
pub trait PulseTimer {
    /// Fire `channel`'s compare interrupt `delta_ticks` after the previous
    /// compare event.
    fn arm_compare_interrupt(&mut self, channel: u8, delta_ticks: u32);

    /// Emit one step pulse on `channel`'s step pin.
    fn step_pulse(&mut self, channel: u8);

    /// Set a direction pin.
    fn write_direction(&mut self, pin: u8, high: bool);
}

/// [`Gpio`] over a fixed set of embedded-hal output pins.
///
/// Pins are already outputs, so `set_pin_mode(Output)` only checks the pin
/// is known.
pub struct OutputPinBank<P: OutputPin, const N: usize> {
    pins: Vec<(u8, P), N>,
}

impl<P: OutputPin, const N: usize> OutputPinBank<P, N> {
    /// Empty bank.
    pub const fn new() -> Self {
        Self { pins: Vec::new() }
    }

    /// Register `pin` under `number`.
    ///
    /// # Errors
    ///
    /// `MotorError::InvalidPin` if the bank is full or `number` is taken.
    pub fn add(&mut self, number: u8, pin: P) -> Result<()> {
        if self.pins.iter().any(|(n, _)| *n == number) {
            return Err(MotorError::InvalidPin(number).into());
        }
        self.pins
            .push((number, pin))
            .map_err(|_| MotorError::InvalidPin(number).into())
    }

    /// Builder form of [`add`](Self::add).
    ///
    /// # Errors
    ///
    /// As for `add`.
    pub fn with_pin(mut self, number: u8, pin: P) -> Result<Self> {
        self.add(number, pin)?;
        Ok(self)
    }

    /// Borrow the pin registered under `number`.
    pub fn pin_mut(&mut self, number: u8) -> Option<&mut P> {
        self.pins
            .iter_mut()
            .find(|(n, _)| *n == number)
            .map(|(_, p)| p)
    }

    /// Release the pins.
    pub fn into_pins(self) -> Vec<(u8, P), N> {
        self.pins
    }
}

impl<P: OutputPin, const N: usize> Default for OutputPinBank<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin, const N: usize> Gpio for OutputPinBank<P, N> {
    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        match (mode, self.pin_mut(pin)) {
            (PinMode::Output, Some(_)) => Ok(()),
            _ => Err(MotorError::InvalidPin(pin).into()),
        }
    }

    fn set_pin_level(&mut self, pin: u8, high: bool) -> Result<()> {
        let p = self.pin_mut(pin).ok_or(MotorError::InvalidPin(pin))?;
        p.set_state(PinState::from(high))
            .map_err(|_| MotorError::PinError.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as MockState, Transaction as PinTransaction,
    };

    #[test]
    fn test_pin_bank_levels() {
        let expectations = [
            PinTransaction::set(MockState::Low),
            PinTransaction::set(MockState::High),
        ];
        let mut enable = PinMock::new(&expectations);

        let mut bank: OutputPinBank<PinMock, 4> = OutputPinBank::new();
        bank.add(8, enable.clone()).unwrap();

        bank.set_pin_mode(8, PinMode::Output).unwrap();
        bank.set_pin_level(8, false).unwrap();
        bank.set_pin_level(8, true).unwrap();

        enable.done();
    }

    #[test]
    fn test_pin_bank_unknown_pin() {
        let mut pin = PinMock::new(&[]);
        let mut bank: OutputPinBank<PinMock, 1> = OutputPinBank::new();
        bank.add(3, pin.clone()).unwrap();

        assert_eq!(
            bank.set_pin_level(4, true),
            Err(Error::Motor(MotorError::InvalidPin(4)))
        );
        assert_eq!(
            bank.set_pin_mode(3, PinMode::Input),
            Err(Error::Motor(MotorError::InvalidPin(3)))
        );
        // full
        let mut extra = PinMock::new(&[]);
        assert!(bank.add(5, extra.clone()).is_err());

        extra.done();
        pin.done();
    }

    #[test]
    fn test_pin_bank_builder_and_release() {
        let step = PinMock::new(&[PinTransaction::set(MockState::High)]);
        let dir = PinMock::new(&[]);

        let mut bank: OutputPinBank<PinMock, 2> = OutputPinBank::new()
            .with_pin(2, step.clone())
            .unwrap()
            .with_pin(3, dir.clone())
            .unwrap();
        bank.set_pin_level(2, true).unwrap();

        let mut first = PinMock::new(&[]);
        let mut second = PinMock::new(&[]);
        let duplicate = OutputPinBank::<PinMock, 2>::new()
            .with_pin(2, first.clone())
            .and_then(|b| b.with_pin(2, second.clone()));
        assert!(matches!(
            duplicate,
            Err(Error::Motor(MotorError::InvalidPin(2)))
        ));
        first.done();
        second.done();

        let pins = bank.into_pins();
        assert_eq!(pins.iter().map(|(n, _)| *n).collect::<Vec<u8, 2>>(), [2, 3]);
        for (_, mut pin) in pins {
            pin.done();
        }
    }
}
