//! Per-axis motor controller.
//!
//! Owns the producer half of one step queue and keeps it topped up from the
//! ramp generator. All methods run in the foreground; the interrupt only
//! ever sees the queue.

use crate::config::Platform;
use crate::error::{QueueError, Result};
use crate::hal::{Gpio, PinMode, StepperHal};
use crate::motion::{Direction, PlannedStep, RampGenerator, RampParameters, RampProfile, RampState};
use crate::queue::{QueueProducer, StepCommand};

use super::position::Position;

/// State and queue of one stepper.
pub struct MotorController<'q, const Q: usize> {
    /// Pulse channel.
    stepper_num: u8,
    /// Order of connection.
    queue_num: u8,
    step_pin: u8,
    dir_pin: Option<u8>,
    enable_pin: Option<u8>,
    enable_active_low: bool,
    invert_direction: bool,
    auto_enable: bool,
    outputs_enabled: bool,

    /// Staged by `set_speed`, applied on the next move or stop.
    min_step_us: u32,
    /// Staged by `set_acceleration`, applied on the next move or stop.
    acceleration: u32,

    platform: Platform,
    ramp: RampGenerator,
    position: Position,
    profile: RampProfile,
    /// State of the most recently queued entry.
    queued_state: RampState,
    /// The ramp generator owns the queue; cleared by raw queue entries.
    ramp_generation: bool,
    /// Set when this controller started the consumer.
    in_motion: bool,

    producer: QueueProducer<'q, Q>,
}

impl<'q, const Q: usize> MotorController<'q, Q> {
    pub(crate) fn new(
        stepper_num: u8,
        queue_num: u8,
        step_pin: u8,
        platform: Platform,
        mut producer: QueueProducer<'q, Q>,
    ) -> Self {
        // the queue may have served another motor before
        producer.set_direction_pin(None);
        producer.set_direction_inverted(false);
        Self {
            stepper_num,
            queue_num,
            step_pin,
            dir_pin: None,
            enable_pin: None,
            enable_active_low: true,
            invert_direction: false,
            auto_enable: false,
            outputs_enabled: false,
            min_step_us: 0,
            acceleration: 0,
            platform,
            ramp: RampGenerator::new(),
            position: Position::default(),
            profile: RampProfile::zero(),
            queued_state: RampState::Idle,
            ramp_generation: true,
            in_motion: false,
            producer,
        }
    }

    /// Give the queue back to the engine.
    pub(crate) fn into_producer(self) -> QueueProducer<'q, Q> {
        self.producer
    }

    /// Pulse channel driving this motor.
    #[inline]
    pub fn stepper_num(&self) -> u8 {
        self.stepper_num
    }

    /// Connection order.
    #[inline]
    pub fn queue_num(&self) -> u8 {
        self.queue_num
    }

    /// Step pin given at connection.
    #[inline]
    pub fn step_pin(&self) -> u8 {
        self.step_pin
    }

    /// Direction pin, if set.
    #[inline]
    pub fn direction_pin(&self) -> Option<u8> {
        self.dir_pin
    }

    /// Enable pin, if set.
    #[inline]
    pub fn enable_pin(&self) -> Option<u8> {
        self.enable_pin
    }

    /// Configure the direction pin and hand it to the interrupt.
    pub fn set_direction_pin<H: Gpio>(&mut self, hal: &mut H, pin: u8) -> Result<()> {
        hal.set_pin_mode(pin, PinMode::Output)?;
        let level = self.ramp.direction().pin_level(self.invert_direction);
        hal.set_pin_level(pin, level)?;
        self.dir_pin = Some(pin);
        self.producer.set_direction_pin(Some(pin));
        Ok(())
    }

    /// Configure the enable pin, leaving the driver in its current state.
    pub fn set_enable_pin<H: Gpio>(&mut self, hal: &mut H, pin: u8) -> Result<()> {
        hal.set_pin_mode(pin, PinMode::Output)?;
        hal.set_pin_level(pin, self.enable_level(self.outputs_enabled))?;
        self.enable_pin = Some(pin);
        Ok(())
    }

    /// Polarity of the enable line; true (the default) means low enables.
    pub fn set_enable_active_low(&mut self, active_low: bool) {
        self.enable_active_low = active_low;
    }

    /// Swap the direction pin level for both directions.
    pub fn set_invert_direction(&mut self, invert: bool) {
        self.invert_direction = invert;
        self.producer.set_direction_inverted(invert);
    }

    /// Drive the enable line active.
    pub fn enable_outputs<H: Gpio>(&mut self, hal: &mut H) -> Result<()> {
        if let Some(pin) = self.enable_pin {
            hal.set_pin_level(pin, self.enable_level(true))?;
        }
        self.outputs_enabled = true;
        Ok(())
    }

    /// Drive the enable line inactive.
    pub fn disable_outputs<H: Gpio>(&mut self, hal: &mut H) -> Result<()> {
        if let Some(pin) = self.enable_pin {
            hal.set_pin_level(pin, self.enable_level(false))?;
        }
        self.outputs_enabled = false;
        Ok(())
    }

    /// True after `enable_outputs` until `disable_outputs`.
    #[inline]
    pub fn outputs_enabled(&self) -> bool {
        self.outputs_enabled
    }

    /// Enable outputs before each motion and disable them once idle.
    pub fn set_auto_enable(&mut self, auto_enable: bool) {
        self.auto_enable = auto_enable;
    }

    /// Minimum time between steps in µs; sets the maximum speed.
    ///
    /// Takes effect on the next `move`, `move_to` or `stop_move`.
    pub fn set_speed(&mut self, min_step_us: u32) {
        self.min_step_us = min_step_us;
    }

    /// Configured minimum step interval in µs.
    #[inline]
    pub fn speed(&self) -> u32 {
        self.min_step_us
    }

    /// Acceleration in steps/s².
    ///
    /// Takes effect on the next `move`, `move_to` or `stop_move`.
    pub fn set_acceleration(&mut self, steps_per_s2: u32) {
        self.acceleration = steps_per_s2;
    }

    /// Configured acceleration in steps/s².
    #[inline]
    pub fn acceleration(&self) -> u32 {
        self.acceleration
    }

    /// Move by `steps` relative to the current target (or to the position
    /// after queued commands when at rest).
    pub fn move_by<H: StepperHal>(&mut self, hal: &mut H, steps: i32) -> Result<()> {
        let base = if self.ramp.is_idle() {
            self.position.at_queue_end()
        } else {
            self.ramp.target()
        };
        self.move_to(hal, base.wrapping_add(steps))
    }

    /// Move to an absolute position.
    ///
    /// # Errors
    ///
    /// `MotionError` if speed or acceleration were never set; GPIO errors
    /// from auto-enable.
    pub fn move_to<H: StepperHal>(&mut self, hal: &mut H, target: i32) -> Result<()> {
        let params = self.parameters()?;
        if !self.ramp_generation {
            // raw entries may still be queued; plan from where they end
            self.ramp.abort(self.position.at_queue_end());
            self.ramp_generation = true;
        }

        let was_idle = self.ramp_state() == RampState::Idle;
        self.profile = self.ramp.start_move(params, target, self.position.at_queue_end());
        if was_idle && !self.ramp.is_idle() {
            self.queued_state = RampState::Accelerate;
        }
        self.fill_queue(hal)
    }

    /// Decelerate to a stop as fast as the acceleration allows.
    pub fn stop_move<H: StepperHal>(&mut self, hal: &mut H) -> Result<()> {
        let params = self.parameters().ok();
        self.ramp.stop(params, self.position.at_queue_end());
        if self.ramp.state() == RampState::DecelerateToStop {
            self.queued_state = RampState::DecelerateToStop;
        }
        self.fill_queue(hal)
    }

    /// Target of the current (or last) move.
    #[inline]
    pub fn target_pos(&self) -> i32 {
        self.ramp.target()
    }

    /// Position now.
    ///
    /// While running this may lead the physical motor by the pulses left in
    /// the entry the interrupt is executing.
    pub fn current_position(&self) -> i32 {
        self.position.current(self.producer.pending())
    }

    /// Redefine the current position without moving.
    pub fn set_current_position(&mut self, position: i32) {
        let offset = position.wrapping_sub(self.current_position());
        self.shift(offset);
    }

    /// Position once all queued commands have run.
    #[inline]
    pub fn position_after_commands_completed(&self) -> i32 {
        self.position.at_queue_end()
    }

    /// Redefine the position after queued commands; shifts the current
    /// position by the same amount immediately.
    pub fn set_position_after_commands_completed(&mut self, position: i32) {
        let offset = position.wrapping_sub(self.position.at_queue_end());
        self.shift(offset);
    }

    fn shift(&mut self, offset: i32) {
        self.position.shift(offset);
        self.ramp.shift(offset);
    }

    /// True unless idle.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.ramp_state() != RampState::Idle
    }

    /// Ramp state as seen from outside.
    ///
    /// Idle only once nothing is left to plan and the interrupt has run the
    /// queue dry.
    pub fn ramp_state(&self) -> RampState {
        if self.ramp.is_idle() && !self.producer.is_consumer_running() {
            RampState::Idle
        } else {
            self.queued_state
        }
    }

    /// True if the interrupt is not running and nothing is queued.
    pub fn is_stopped(&self) -> bool {
        !self.producer.is_consumer_running() && self.producer.is_empty()
    }

    /// True while the ramp generator feeds the queue.
    #[inline]
    pub fn is_ramp_generation_active(&self) -> bool {
        self.ramp_generation
    }

    /// Nothing queued.
    #[inline]
    pub fn is_queue_empty(&self) -> bool {
        self.producer.is_empty()
    }

    /// No free slot.
    #[inline]
    pub fn is_queue_full(&self) -> bool {
        self.producer.is_full()
    }

    /// Profile planned by the last move request.
    #[inline]
    pub fn profile(&self) -> &RampProfile {
        &self.profile
    }

    /// Ramp generator, for inspection.
    #[inline]
    pub fn ramp(&self) -> &RampGenerator {
        &self.ramp
    }

    /// Queue one raw entry, bypassing the ramp generator.
    ///
    /// Disables ramp generation until the next `move`/`move_to`; anything
    /// the generator had not yet queued is dropped.
    ///
    /// # Errors
    ///
    /// The entry is checked before the queue: `StepsError`, `DeltaTooHigh`,
    /// `DeltaTooLow`, then `Full`. A rejected entry leaves the queue
    /// untouched.
    pub fn add_queue_entry<H: StepperHal>(
        &mut self,
        hal: &mut H,
        start_delta_ticks: u32,
        steps: u8,
        dir_high: bool,
    ) -> core::result::Result<(), QueueError> {
        let command = StepCommand::new(
            start_delta_ticks,
            steps,
            dir_high,
            self.platform.min_delta_ticks(),
        )?;
        self.producer.try_push(command)?;

        self.ramp_generation = false;
        self.position.record(&command);
        self.ramp.abort(self.position.at_queue_end());
        self.queued_state = RampState::Coast;

        // The entry is queued and the channel starts either way; only the
        // auto-enable write can fail here.
        if self.start_consumer(hal).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("stepper {=u8}: enable pin write failed", self.stepper_num);
        }
        Ok(())
    }

    /// Top up the queue from the ramp generator and start the interrupt if
    /// needed. Also detects starvation and applies auto-disable.
    pub fn fill_queue<H: StepperHal>(&mut self, hal: &mut H) -> Result<()> {
        if self.in_motion && !self.producer.is_consumer_running() {
            self.in_motion = false;
            if self.ramp_generation && !self.ramp.is_idle() && self.ramp.performed_ramp_up_steps() > 0 {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "stepper {=u8}: queue starved at {=i32}",
                    self.stepper_num,
                    self.position.at_queue_end()
                );
                self.ramp.abort(self.position.at_queue_end());
            }
        }

        let mut pushed = false;
        if self.ramp_generation {
            while !self.producer.is_full() {
                let Some(step) = self.ramp.next_step(self.position.at_queue_end()) else {
                    break;
                };
                let command = Self::command_for(&step);
                if self.producer.try_push(command).is_err() {
                    break;
                }
                self.position.record(&command);
                self.queued_state = step.state;
                pushed = true;
            }
        }

        if pushed {
            self.start_consumer(hal)?;
        } else if self.auto_enable
            && self.outputs_enabled
            && !self.in_motion
            && self.ramp.is_idle()
            && self.producer.is_empty()
        {
            self.disable_outputs(hal)?;
        }
        Ok(())
    }

    fn start_consumer<H: StepperHal>(&mut self, hal: &mut H) -> Result<()> {
        self.in_motion = true;
        if self.producer.is_consumer_running() {
            return Ok(());
        }
        let enabled = if self.auto_enable && !self.outputs_enabled {
            self.enable_outputs(hal)
        } else {
            Ok(())
        };
        self.producer.mark_running();
        hal.start_pulse_train(self.stepper_num);
        enabled
    }

    fn command_for(step: &PlannedStep) -> StepCommand {
        let up = step.direction == Direction::Clockwise;
        if step.steps == 0 {
            StepCommand::pause(step.delta_ticks, up)
        } else {
            StepCommand::planned(step.delta_ticks, step.steps, up)
        }
    }

    fn parameters(&self) -> Result<RampParameters> {
        Ok(RampParameters::compute(
            self.min_step_us,
            self.acceleration,
            &self.platform,
        )?)
    }

    fn enable_level(&self, enabled: bool) -> bool {
        enabled != self.enable_active_low
    }
}

impl<'q, const Q: usize> core::fmt::Debug for MotorController<'q, Q> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotorController")
            .field("stepper_num", &self.stepper_num)
            .field("step_pin", &self.step_pin)
            .field("position", &self.position)
            .field("ramp", &self.ramp)
            .finish_non_exhaustive()
    }
}
