//! Trapezoidal ramp generator.
//!
//! Produces queue entries one at a time from the current ramp index, the
//! position at the end of the queue and the target. Intervals follow the
//! constant-acceleration recurrence
//!
//! ```text
//! c_0 = 0.676 * F * sqrt(2 / a)
//! c_n = c_{n-1} * (4n - 1) / (4n + 1)
//! ```
//!
//! evaluated in [`FixedScalar`] so each step costs two multiplies and one
//! small reciprocal. Deceleration runs the same relation backwards.
//!
//! The generator never looks at the queue; the caller decides how many
//! entries to request.

use crate::config::{Microseconds, Platform};
use crate::error::MotionError;
use crate::queue::ABSOLUTE_MAX_TICKS;

use super::profile::{Direction, RampProfile};
use super::scalar::FixedScalar;
use super::state::RampState;

/// Coasting steps are batched into entries about this many per second long.
const COAST_BATCHES_PER_SECOND: u32 = 500;

/// Parameters derived from speed and acceleration.
///
/// Computed when a move or stop is requested, so changes to the configured
/// values never alter a ramp already being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampParameters {
    /// Interval at maximum speed, in ticks.
    pub min_travel_ticks: u32,
    /// Steps to reach maximum speed from standstill.
    pub ramp_steps_total: u32,
    /// Acceleration in steps/s².
    pub acceleration: u32,
    /// `F² / (2a)` with `F` the tick rate.
    pub inverse_acceleration2: FixedScalar,
    /// Interval of the first step from standstill.
    pub first_interval: FixedScalar,
    /// Longest span a batch of coasting steps may occupy.
    pub coast_batch_ticks: u32,
}

impl RampParameters {
    /// Derive the ramp constants.
    ///
    /// # Errors
    ///
    /// [`MotionError::SpeedNotSet`] or [`MotionError::AccelerationNotSet`] if
    /// either value is zero.
    pub fn compute(
        min_step_us: u32,
        acceleration: u32,
        platform: &Platform,
    ) -> Result<Self, MotionError> {
        if min_step_us == 0 {
            return Err(MotionError::SpeedNotSet);
        }
        if acceleration == 0 {
            return Err(MotionError::AccelerationNotSet);
        }

        let f = u64::from(platform.ticks_per_second());
        let min_travel_ticks = Microseconds(min_step_us)
            .to_ticks(platform.tick_rate())
            .value()
            .max(platform.min_delta_ticks());

        // v_max² / 2a with v_max = F / t, kept exact
        let f2 = u128::from(f) * u128::from(f);
        let t = u128::from(min_travel_ticks);
        let ramp_steps_total =
            (f2 / (2 * u128::from(acceleration) * t * t)).min(u128::from(u32::MAX)) as u32;

        let inverse_acceleration2 = FixedScalar::from_u64((f * f) / (2 * u64::from(acceleration)));
        // 0.676 * F * sqrt(2 / a) = 1.352 * sqrt(F² / 2a)
        let first_interval = inverse_acceleration2.sqrt() * FixedScalar::from_ratio(1352, 1000);

        Ok(Self {
            min_travel_ticks,
            ramp_steps_total,
            acceleration,
            inverse_acceleration2,
            first_interval,
            coast_batch_ticks: platform.ticks_per_second() / COAST_BATCHES_PER_SECOND,
        })
    }

    /// Maximum speed in steps/s.
    pub fn max_speed(&self, platform: &Platform) -> f32 {
        platform.ticks_per_second() as f32 / self.min_travel_ticks.max(1) as f32
    }
}

/// One entry requested from the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlannedStep {
    /// Ticks before each pulse.
    pub delta_ticks: u32,
    /// Pulses; zero for a pause that only carries time.
    pub steps: u8,
    /// Direction of travel.
    pub direction: Direction,
    /// Ramp state the entry belongs to.
    pub state: RampState,
}

/// An interval too long for one entry, paid out as pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct LongInterval {
    pauses_left: u32,
    /// Ticks per chunk.
    chunk: u32,
    /// The first `extra` pauses are one tick longer.
    extra: u32,
    step: Option<PlannedStep>,
}

/// Per-motor ramp state machine.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampGenerator {
    params: Option<RampParameters>,
    state: RampState,
    direction: Direction,
    target: i32,
    /// Performed ramp-up steps; the speed index.
    ramp_index: u32,
    /// Interval of the most recent ramp step, `c_{ramp_index - 1}`.
    interval: FixedScalar,
    long: LongInterval,
    /// Steps planned since the last move request.
    move_steps: u32,
    deceleration_start: u32,
}

impl Default for RampGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RampGenerator {
    /// Idle generator.
    pub const fn new() -> Self {
        Self {
            params: None,
            state: RampState::Idle,
            direction: Direction::Clockwise,
            target: 0,
            ramp_index: 0,
            interval: FixedScalar::ZERO,
            long: LongInterval {
                pauses_left: 0,
                chunk: 0,
                extra: 0,
                step: None,
            },
            move_steps: 0,
            deceleration_start: 0,
        }
    }

    /// True when there is nothing left to plan.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == RampState::Idle
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> RampState {
        self.state
    }

    /// Position the current move ends at.
    #[inline]
    pub fn target(&self) -> i32 {
        self.target
    }

    /// Direction of the current motion.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Performed ramp-up steps; zero at standstill.
    #[inline]
    pub fn performed_ramp_up_steps(&self) -> u32 {
        self.ramp_index
    }

    /// Steps to full speed under the active parameters.
    #[inline]
    pub fn ramp_steps_total(&self) -> u32 {
        self.params.map_or(0, |p| p.ramp_steps_total)
    }

    /// Step of the current move at which deceleration begins.
    #[inline]
    pub fn deceleration_start(&self) -> u32 {
        self.deceleration_start
    }

    /// Steps planned since the last move request.
    #[inline]
    pub fn move_steps(&self) -> u32 {
        self.move_steps
    }

    /// Parameters in effect.
    #[inline]
    pub fn parameters(&self) -> Option<&RampParameters> {
        self.params.as_ref()
    }

    /// Start (or retarget) a move.
    ///
    /// `position` is where the queue will leave the motor. Returns the
    /// planned profile; a zero profile means nothing will be generated.
    pub fn start_move(&mut self, params: RampParameters, target: i32, position: i32) -> RampProfile {
        self.apply(params);
        self.target = target;
        self.move_steps = 0;

        let delta = i64::from(target) - i64::from(position);
        let moving = self.ramp_index > 0 || self.long.step.is_some();
        if delta == 0 && !moving {
            self.state = RampState::Idle;
            self.deceleration_start = 0;
            return RampProfile::from_standstill(0, params.ramp_steps_total);
        }

        let profile = if moving && delta != 0 && Direction::from_steps(delta) == self.direction {
            RampProfile::plan(delta, self.ramp_index, params.ramp_steps_total)
        } else {
            // reversal or stop-and-return: the profile covers the part after
            // the motor has come to rest
            RampProfile::from_standstill(delta, params.ramp_steps_total)
        };
        self.deceleration_start = profile.deceleration_start;
        if !moving || self.state == RampState::DecelerateToStop || self.is_idle() {
            self.state = RampState::Accelerate;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "move to {=i32}: {=u32} accel, {=u32} coast, {=u32} decel",
            target,
            profile.accel_steps,
            profile.coast_steps,
            profile.decel_steps
        );

        profile
    }

    /// Decelerate to standstill, discarding the target.
    ///
    /// `params` is `None` if speed or acceleration are currently unusable;
    /// the parameters of the running move are kept in that case.
    pub fn stop(&mut self, params: Option<RampParameters>, position: i32) {
        if let Some(params) = params {
            self.apply(params);
        }
        if self.ramp_index == 0 && self.long.step.is_none() {
            self.finish(position);
        } else if !self.is_idle() {
            self.state = RampState::DecelerateToStop;
        }
    }

    /// Forget the motion in progress and rest at `position`.
    ///
    /// Used when the queue starved or was taken over by raw entries.
    pub fn abort(&mut self, position: i32) {
        self.finish(position);
    }

    /// Move the target by `offset`, keeping its distance to the position.
    pub fn shift(&mut self, offset: i32) {
        self.target = self.target.wrapping_add(offset);
    }

    /// Plan the next entry, given the position after all queued entries.
    ///
    /// Returns `None` and goes idle once the move is complete.
    pub fn next_step(&mut self, position: i32) -> Option<PlannedStep> {
        if let Some(step) = self.long.step {
            return Some(self.next_long_chunk(step));
        }

        let step = self.plan_step(position)?;
        if step.delta_ticks > ABSOLUTE_MAX_TICKS {
            return Some(self.split_long(step));
        }
        self.move_steps = self.move_steps.saturating_add(u32::from(step.steps));
        Some(step)
    }

    fn apply(&mut self, params: RampParameters) {
        if let Some(old) = self.params {
            if old.acceleration != params.acceleration && self.ramp_index > 0 {
                // same speed, new acceleration: rescale the index
                let scaled = u64::from(self.ramp_index) * u64::from(old.acceleration)
                    / u64::from(params.acceleration);
                self.ramp_index = scaled.clamp(1, u64::from(u32::MAX)) as u32;
            }
        }
        self.params = Some(params);
    }

    fn finish(&mut self, position: i32) {
        #[cfg(feature = "defmt")]
        defmt::trace!("ramp idle at {=i32}", position);

        self.state = RampState::Idle;
        self.target = position;
        self.ramp_index = 0;
        self.interval = FixedScalar::ZERO;
        self.long = LongInterval::default();
    }

    fn plan_step(&mut self, position: i32) -> Option<PlannedStep> {
        let params = self.params?;

        if self.state == RampState::Idle {
            return None;
        }
        if self.state == RampState::DecelerateToStop {
            if self.ramp_index == 0 {
                self.finish(position);
                return None;
            }
            return Some(self.descend(&params, RampState::DecelerateToStop));
        }

        let delta = i64::from(self.target) - i64::from(position);
        let r = self.ramp_index;
        if r == 0 {
            if delta == 0 {
                self.state = RampState::Idle;
                self.long = LongInterval::default();
                self.interval = FixedScalar::ZERO;
                return None;
            }
            self.direction = Direction::from_steps(delta);
        }

        // Moving away from the target, or exactly on it: stop first
        if delta == 0 || Direction::from_steps(delta) != self.direction {
            return Some(self.descend(&params, RampState::Decelerate));
        }

        let remaining = delta.unsigned_abs();
        if r > params.ramp_steps_total || remaining <= u64::from(r) {
            return Some(self.descend(&params, RampState::Decelerate));
        }
        if r < params.ramp_steps_total && remaining >= u64::from(r) + 2 {
            return Some(self.accelerate(&params));
        }

        // hold speed
        if r == params.ramp_steps_total {
            let delta_ticks = params.min_travel_ticks;
            let coast_left = remaining - u64::from(r);
            let by_time = (params.coast_batch_ticks / delta_ticks.max(1)).max(1);
            let steps = coast_left.min(255).min(u64::from(by_time)) as u8;
            self.state = RampState::Coast;
            Some(PlannedStep {
                delta_ticks,
                steps,
                direction: self.direction,
                state: RampState::Coast,
            })
        } else {
            // odd triangular move: one step at the apex
            let apex = if r == 0 {
                params.first_interval
            } else {
                self.interval
            };
            self.state = RampState::Decelerate;
            Some(PlannedStep {
                delta_ticks: clamp_interval(apex, &params),
                steps: 1,
                direction: self.direction,
                state: RampState::Decelerate,
            })
        }
    }

    fn accelerate(&mut self, params: &RampParameters) -> PlannedStep {
        let r = self.ramp_index;
        self.interval = if r == 0 {
            params.first_interval
        } else {
            let n = u64::from(r) * 4;
            self.interval * FixedScalar::from_u64(n - 1) * FixedScalar::from_u64(n + 1).recip()
        };
        self.ramp_index = r + 1;

        #[cfg(feature = "defmt")]
        if self.state != RampState::Accelerate {
            defmt::trace!("ramp {} -> Accelerate", self.state);
        }
        self.state = RampState::Accelerate;

        PlannedStep {
            delta_ticks: clamp_interval(self.interval, params),
            steps: 1,
            direction: self.direction,
            state: RampState::Accelerate,
        }
    }

    fn descend(&mut self, params: &RampParameters, state: RampState) -> PlannedStep {
        let delta_ticks = clamp_interval(self.interval, params);
        self.ramp_index = self.ramp_index.saturating_sub(1);
        let r = self.ramp_index;
        if r >= 1 {
            let n = u64::from(r) * 4;
            self.interval =
                self.interval * FixedScalar::from_u64(n + 1) * FixedScalar::from_u64(n - 1).recip();
        }

        #[cfg(feature = "defmt")]
        if self.state != state {
            defmt::trace!("ramp {} -> {}", self.state, state);
        }
        self.state = state;

        PlannedStep {
            delta_ticks,
            steps: 1,
            direction: self.direction,
            state,
        }
    }

    /// Split an over-long interval into `n` nearly equal chunks: `n - 1`
    /// pauses followed by the step itself.
    fn split_long(&mut self, step: PlannedStep) -> PlannedStep {
        let total = step.delta_ticks;
        let n = total / ABSOLUTE_MAX_TICKS + u32::from(total % ABSOLUTE_MAX_TICKS != 0);
        let chunk = total / n;
        let extra = total % n;
        self.long = LongInterval {
            pauses_left: n - 1,
            chunk,
            extra,
            step: Some(PlannedStep {
                delta_ticks: chunk,
                ..step
            }),
        };
        self.next_long_chunk(step)
    }

    fn next_long_chunk(&mut self, step: PlannedStep) -> PlannedStep {
        let long = &mut self.long;
        if long.pauses_left == 0 {
            long.step = None;
            let step = PlannedStep {
                delta_ticks: long.chunk,
                ..step
            };
            self.move_steps = self.move_steps.saturating_add(u32::from(step.steps));
            return step;
        }
        long.pauses_left -= 1;
        let mut delta_ticks = long.chunk;
        if long.extra > 0 {
            long.extra -= 1;
            delta_ticks += 1;
        }
        PlannedStep {
            delta_ticks,
            steps: 0,
            direction: step.direction,
            state: step.state,
        }
    }
}

fn clamp_interval(interval: FixedScalar, params: &RampParameters) -> u32 {
    interval.to_u32().max(params.min_travel_ticks)
}
