//! Channel registry: which motor drives which pulse channel.

use heapless::String;

use crate::config::{
    MotorConfig, Platform, PlatformKind, SystemConfig, AVR_STEP_PIN_A, AVR_STEP_PIN_B, MAX_STEPPER,
};
use crate::error::{ConfigError, EngineError, Error, Result};
use crate::hal::{PinMode, StepperHal};
use crate::motor::MotorController;
use crate::queue::{QueueProducer, StepQueue, DEFAULT_QUEUE_LEN};

use super::handle::Stepper;
use super::led::DebugLed;
use super::pulse::PulseGenerator;
use super::StepperId;

/// Foreground half of the engine.
///
/// Owns the board's [`StepperHal`] and one [`MotorController`] slot per pulse
/// channel. Controllers are created by connecting a step pin and are never
/// destroyed; [`init`](Self::init) is the only way to free a channel, and
/// only a stopped channel is freed.
///
/// # Example
///
/// ```rust,ignore
/// use stepper_pulse::{Platform, StepQueue, StepperEngine};
///
/// let mut queues: [StepQueue<32>; 2] = [StepQueue::new(), StepQueue::new()];
/// let (mut engine, pulses) = StepperEngine::new(Platform::host(), hal, &mut queues);
/// // hand `pulses` to the compare interrupt
///
/// let id = engine.stepper_connect_to_pin(10).unwrap();
/// let mut stepper = engine.stepper(id).unwrap();
/// stepper.set_speed(100);
/// stepper.set_acceleration(1000);
/// stepper.move_to(1000)?;
///
/// loop {
///     engine.manage_steppers()?;
/// }
/// ```
pub struct StepperEngine<'q, H: StepperHal, const Q: usize = DEFAULT_QUEUE_LEN> {
    platform: Platform,
    hal: H,
    /// Producers of channels with no motor attached.
    free: [Option<QueueProducer<'q, Q>>; MAX_STEPPER],
    /// Connected motors, indexed by channel.
    steppers: [Option<MotorController<'q, Q>>; MAX_STEPPER],
    connected: u8,
    debug_led: Option<DebugLed>,
}

impl<'q, H: StepperHal, const Q: usize> StepperEngine<'q, H, Q> {
    /// Split `queues` between the engine and the interrupt side.
    ///
    /// Queue `i` serves channel `i`. Channels beyond the platform's count or
    /// beyond `queues.len()` are unavailable.
    pub fn new(platform: Platform, hal: H, queues: &'q mut [StepQueue<Q>]) -> (Self, PulseGenerator<'q, Q>) {
        let mut free: [Option<QueueProducer<'q, Q>>; MAX_STEPPER] = core::array::from_fn(|_| None);
        let mut pulses = PulseGenerator::new();
        let channels = platform.max_steppers().min(MAX_STEPPER);
        for (channel, queue) in queues.iter_mut().take(channels).enumerate() {
            let (producer, consumer) = queue.split();
            free[channel] = Some(producer);
            pulses.attach(channel, consumer);
        }

        let engine = Self {
            platform,
            hal,
            free,
            steppers: core::array::from_fn(|_| None),
            connected: 0,
            debug_led: None,
        };
        (engine, pulses)
    }

    /// Reset the registry: disconnect every motor and drop the debug LED.
    ///
    /// # Errors
    ///
    /// `EngineError::ChannelBusy` for the first channel that still has
    /// entries queued or pulses in flight. That motor stays connected; every
    /// stopped one is still freed.
    pub fn init(&mut self) -> Result<()> {
        let mut result = Ok(());
        for channel in 0..MAX_STEPPER {
            if let Err(e) = self.disconnect(channel) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        if result.is_ok() {
            self.connected = 0;
        }
        self.debug_led = None;
        result
    }

    /// Attach a motor to `step_pin`.
    ///
    /// The pin is set up as a low output. On platforms with hard-wired
    /// compare outputs the pin picks the channel; elsewhere the lowest free
    /// channel is used.
    ///
    /// # Errors
    ///
    /// - `EngineError::UnsupportedPin` if the platform cannot pulse `step_pin`
    /// - `EngineError::PinInUse` if another motor already steps on it
    /// - `EngineError::NoFreeChannel` if the channel it needs is taken
    /// - GPIO errors from configuring the pin
    pub fn try_connect_to_pin(&mut self, step_pin: u8) -> Result<StepperId> {
        if !self.platform.is_valid_step_pin(step_pin) {
            #[cfg(feature = "defmt")]
            defmt::warn!("pin {=u8} cannot carry step pulses", step_pin);
            return Err(EngineError::UnsupportedPin(step_pin).into());
        }
        if self.steppers.iter().flatten().any(|s| s.step_pin() == step_pin) {
            #[cfg(feature = "defmt")]
            defmt::warn!("pin {=u8} already drives a stepper", step_pin);
            return Err(EngineError::PinInUse(step_pin).into());
        }

        let channel = match self.platform.fixed_channel(step_pin) {
            Some(channel) => channel,
            None => self
                .free
                .iter()
                .position(Option::is_some)
                .ok_or(EngineError::NoFreeChannel)?,
        };
        if self.free.get(channel).map_or(true, Option::is_none) {
            return Err(EngineError::NoFreeChannel.into());
        }

        self.hal.set_pin_mode(step_pin, PinMode::Output)?;
        self.hal.set_pin_level(step_pin, false)?;

        let producer = self.free[channel].take().ok_or(EngineError::NoFreeChannel)?;
        let stepper_num = channel as u8;
        self.steppers[channel] = Some(MotorController::new(
            stepper_num,
            self.connected,
            step_pin,
            self.platform,
            producer,
        ));
        self.connected = self.connected.saturating_add(1);

        #[cfg(feature = "defmt")]
        defmt::debug!("stepper on pin {=u8} uses channel {=u8}", step_pin, stepper_num);

        Ok(StepperId(stepper_num))
    }

    /// Attach a motor to `step_pin`, or `None` if that is not possible.
    pub fn stepper_connect_to_pin(&mut self, step_pin: u8) -> Option<StepperId> {
        self.try_connect_to_pin(step_pin).ok()
    }

    /// AVR only: attach a motor to compare output A (pin 9).
    pub fn stepper_a(&mut self) -> Option<StepperId> {
        self.connect_avr(AVR_STEP_PIN_A)
    }

    /// AVR only: attach a motor to compare output B (pin 10).
    pub fn stepper_b(&mut self) -> Option<StepperId> {
        self.connect_avr(AVR_STEP_PIN_B)
    }

    fn connect_avr(&mut self, step_pin: u8) -> Option<StepperId> {
        match self.platform.kind() {
            PlatformKind::Avr => self.stepper_connect_to_pin(step_pin),
            _ => None,
        }
    }

    /// Connect and configure a motor from its configuration table.
    ///
    /// If configuring a pin fails the motor is disconnected again.
    pub fn connect_from_config(&mut self, config: &MotorConfig) -> Result<StepperId> {
        let id = self.try_connect_to_pin(config.step_pin)?;
        if let Err(e) = self.configure(id, config) {
            if self.disconnect(id.index()).is_ok() {
                self.connected = self.connected.saturating_sub(1);
            }
            return Err(e);
        }
        Ok(id)
    }

    /// Connect the motor called `name` in `config`.
    ///
    /// # Errors
    ///
    /// `ConfigError::MotorNotFound` if there is no such motor, otherwise as
    /// for [`connect_from_config`](Self::connect_from_config).
    pub fn connect_named(&mut self, config: &SystemConfig, name: &str) -> Result<StepperId> {
        let motor = config.motor(name).ok_or_else(|| {
            Error::Config(ConfigError::MotorNotFound(
                String::try_from(name).unwrap_or_default(),
            ))
        })?;
        self.connect_from_config(motor)
    }

    fn configure(&mut self, id: StepperId, config: &MotorConfig) -> Result<()> {
        let mut stepper = self.try_stepper(id)?;
        stepper.set_invert_direction(config.invert_direction);
        stepper.set_enable_active_low(config.enable_active_low);
        if let Some(pin) = config.dir_pin {
            stepper.set_direction_pin(pin)?;
        }
        if let Some(pin) = config.enable_pin {
            stepper.set_enable_pin(pin)?;
        }
        stepper.set_auto_enable(config.auto_enable);
        stepper.set_speed(config.min_step_interval.value());
        stepper.set_acceleration(config.acceleration.value());
        Ok(())
    }

    fn disconnect(&mut self, channel: usize) -> Result<()> {
        let Some(slot) = self.steppers.get_mut(channel) else {
            return Ok(());
        };
        if slot.as_ref().map_or(false, |s| !s.is_stopped()) {
            #[cfg(feature = "defmt")]
            defmt::warn!("channel {=usize} still running, not freed", channel);
            return Err(EngineError::ChannelBusy(channel as u8).into());
        }
        if let Some(controller) = slot.take() {
            self.free[channel] = Some(controller.into_producer());
        }
        Ok(())
    }

    /// Motion API of a connected motor.
    pub fn stepper(&mut self, id: StepperId) -> Option<Stepper<'_, 'q, H, Q>> {
        let controller = self.steppers.get_mut(id.index())?.as_mut()?;
        Some(Stepper::new(controller, &mut self.hal))
    }

    /// Like [`stepper`](Self::stepper), with `EngineError::UnknownStepper`
    /// for an unconnected id.
    pub fn try_stepper(&mut self, id: StepperId) -> Result<Stepper<'_, 'q, H, Q>> {
        self.stepper(id)
            .ok_or_else(|| EngineError::UnknownStepper(id.channel()).into())
    }

    /// Read-only view of a connected motor.
    pub fn controller(&self, id: StepperId) -> Option<&MotorController<'q, Q>> {
        self.steppers.get(id.index())?.as_ref()
    }

    /// Ids of every connected motor, by channel.
    pub fn stepper_ids(&self) -> impl Iterator<Item = StepperId> + '_ {
        self.steppers
            .iter()
            .flatten()
            .map(|s| StepperId(s.stepper_num()))
    }

    /// Number of connected motors.
    pub fn stepper_count(&self) -> usize {
        self.steppers.iter().flatten().count()
    }

    /// Blink `pin` at 1 Hz from [`manage_steppers`](Self::manage_steppers).
    pub fn set_debug_led(&mut self, pin: u8) -> Result<()> {
        let now = self.hal.ticks();
        let led = DebugLed::new(&mut self.hal, pin, self.platform.ticks_per_second(), now)?;
        self.debug_led = Some(led);
        Ok(())
    }

    /// Debug LED, if configured.
    pub fn debug_led(&self) -> Option<&DebugLed> {
        self.debug_led.as_ref()
    }

    /// Periodic service: top up every motor's queue and blink the LED.
    ///
    /// Every motor is serviced even if one fails; the first error is
    /// returned.
    pub fn manage_steppers(&mut self) -> Result<()> {
        let mut result = Ok(());
        for controller in self.steppers.iter_mut().flatten() {
            if let Err(e) = controller.fill_queue(&mut self.hal) {
                #[cfg(feature = "defmt")]
                defmt::warn!("stepper {=u8}: refill failed", controller.stepper_num());
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        if let Some(led) = self.debug_led.as_mut() {
            let now = self.hal.ticks();
            led.update(&mut self.hal, now)?;
        }
        result
    }

    /// Platform the engine was built for.
    #[inline]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Board back-end.
    #[inline]
    pub fn hal(&self) -> &H {
        &self.hal
    }

    /// Board back-end, mutably.
    #[inline]
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }
}
