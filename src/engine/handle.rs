//! Borrowed motion API for one connected motor.

use crate::error::{QueueError, Result};
use crate::hal::StepperHal;
use crate::motion::{RampProfile, RampState};
use crate::motor::MotorController;

/// A connected motor together with the board it runs on.
///
/// Obtained from [`StepperEngine::stepper`](super::StepperEngine::stepper).
/// Every call that can touch a pin or start the pulse channel goes through
/// the borrowed HAL.
pub struct Stepper<'e, 'q, H: StepperHal, const Q: usize> {
    controller: &'e mut MotorController<'q, Q>,
    hal: &'e mut H,
}

impl<'e, 'q, H: StepperHal, const Q: usize> Stepper<'e, 'q, H, Q> {
    pub(crate) fn new(controller: &'e mut MotorController<'q, Q>, hal: &'e mut H) -> Self {
        Self { controller, hal }
    }

    /// Underlying controller.
    pub fn controller(&self) -> &MotorController<'q, Q> {
        self.controller
    }

    /// Pulse channel.
    pub fn stepper_num(&self) -> u8 {
        self.controller.stepper_num()
    }

    /// Step pin given at connection.
    pub fn step_pin(&self) -> u8 {
        self.controller.step_pin()
    }

    /// Set up and use `pin` as the direction output.
    pub fn set_direction_pin(&mut self, pin: u8) -> Result<()> {
        self.controller.set_direction_pin(self.hal, pin)
    }

    /// Set up and use `pin` as the driver enable output.
    pub fn set_enable_pin(&mut self, pin: u8) -> Result<()> {
        self.controller.set_enable_pin(self.hal, pin)
    }

    /// Enable line polarity; true means low enables.
    pub fn set_enable_active_low(&mut self, active_low: bool) {
        self.controller.set_enable_active_low(active_low);
    }

    /// Swap the direction pin level for both directions.
    pub fn set_invert_direction(&mut self, invert: bool) {
        self.controller.set_invert_direction(invert);
    }

    /// Drive the enable line active.
    pub fn enable_outputs(&mut self) -> Result<()> {
        self.controller.enable_outputs(self.hal)
    }

    /// Drive the enable line inactive.
    pub fn disable_outputs(&mut self) -> Result<()> {
        self.controller.disable_outputs(self.hal)
    }

    /// Enable before motion, disable once idle.
    pub fn set_auto_enable(&mut self, auto_enable: bool) {
        self.controller.set_auto_enable(auto_enable);
    }

    /// Minimum step interval in µs.
    pub fn set_speed(&mut self, min_step_us: u32) {
        self.controller.set_speed(min_step_us);
    }

    /// Acceleration in steps/s².
    pub fn set_acceleration(&mut self, steps_per_s2: u32) {
        self.controller.set_acceleration(steps_per_s2);
    }

    /// Relative move.
    pub fn move_by(&mut self, steps: i32) -> Result<()> {
        self.controller.move_by(self.hal, steps)
    }

    /// Absolute move.
    pub fn move_to(&mut self, target: i32) -> Result<()> {
        self.controller.move_to(self.hal, target)
    }

    /// Ramp down to a stop.
    pub fn stop_move(&mut self) -> Result<()> {
        self.controller.stop_move(self.hal)
    }

    /// Queue a raw entry, bypassing the ramp generator.
    pub fn add_queue_entry(
        &mut self,
        start_delta_ticks: u32,
        steps: u8,
        dir_high: bool,
    ) -> core::result::Result<(), QueueError> {
        self.controller
            .add_queue_entry(self.hal, start_delta_ticks, steps, dir_high)
    }

    /// Top up this motor's queue only.
    pub fn fill_queue(&mut self) -> Result<()> {
        self.controller.fill_queue(self.hal)
    }

    /// Target of the current or last move.
    pub fn target_pos(&self) -> i32 {
        self.controller.target_pos()
    }

    /// Position now.
    pub fn current_position(&self) -> i32 {
        self.controller.current_position()
    }

    /// Redefine the current position.
    pub fn set_current_position(&mut self, position: i32) {
        self.controller.set_current_position(position);
    }

    /// Position once all queued commands have run.
    pub fn position_after_commands_completed(&self) -> i32 {
        self.controller.position_after_commands_completed()
    }

    /// Redefine the position after queued commands.
    pub fn set_position_after_commands_completed(&mut self, position: i32) {
        self.controller.set_position_after_commands_completed(position);
    }

    /// True unless idle.
    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Ramp state.
    pub fn ramp_state(&self) -> RampState {
        self.controller.ramp_state()
    }

    /// Consumer stopped and nothing queued.
    pub fn is_stopped(&self) -> bool {
        self.controller.is_stopped()
    }

    /// True while the ramp generator feeds the queue.
    pub fn is_ramp_generation_active(&self) -> bool {
        self.controller.is_ramp_generation_active()
    }

    /// Nothing queued.
    pub fn is_queue_empty(&self) -> bool {
        self.controller.is_queue_empty()
    }

    /// No free slot.
    pub fn is_queue_full(&self) -> bool {
        self.controller.is_queue_full()
    }

    /// Profile planned by the last move request.
    pub fn profile(&self) -> &RampProfile {
        self.controller.profile()
    }
}
