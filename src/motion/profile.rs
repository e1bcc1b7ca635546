//! Ramp profile calculation.
//!
//! Describes the shape of a move the ramp generator is about to run:
//! how many steps accelerate, coast and decelerate. The generator itself
//! works step by step; this is the summary reported to the caller.

use libm::sqrtf;

use super::state::RampState;

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Position counts up.
    #[default]
    Clockwise,
    /// Position counts down.
    CounterClockwise,
}

impl Direction {
    /// Get direction from signed step count.
    #[inline]
    pub fn from_steps(steps: i64) -> Self {
        if steps >= 0 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    /// Direction pin level, optionally inverted for motors wired backwards.
    #[inline]
    pub fn pin_level(self, invert: bool) -> bool {
        (self == Direction::Clockwise) != invert
    }
}

/// Planned shape of a move (trapezoidal or triangular).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampProfile {
    /// Total steps to move (absolute value).
    pub total_steps: u32,

    /// Direction of motion.
    pub direction: Direction,

    /// Ramp index the move started from (0 at standstill).
    pub start_ramp_index: u32,

    /// Steps spent speeding up.
    pub accel_steps: u32,

    /// Steps at maximum speed.
    pub coast_steps: u32,

    /// Steps spent slowing down, including an apex hold step.
    pub decel_steps: u32,

    /// Step of this move at which deceleration begins.
    pub deceleration_start: u32,

    /// Steps needed to reach maximum speed from standstill.
    pub ramp_steps_total: u32,
}

impl RampProfile {
    /// Plan a move from standstill.
    ///
    /// With `|move_steps| >= 2 * ramp_steps_total` the result is trapezoidal:
    /// `ramp_steps_total` steps each way and the rest coasting. Shorter moves
    /// are triangular and accelerate for `|move_steps| / 2` steps.
    pub fn from_standstill(move_steps: i64, ramp_steps_total: u32) -> Self {
        Self::plan(move_steps, 0, ramp_steps_total)
    }

    /// Plan a move that starts at ramp index `ramp_index` in the same direction.
    ///
    /// If the motor is already faster than `ramp_steps_total` allows, the
    /// profile starts with deceleration. If it cannot stop within
    /// `|move_steps|`, every step decelerates and the motor overshoots.
    pub fn plan(move_steps: i64, ramp_index: u32, ramp_steps_total: u32) -> Self {
        let direction = Direction::from_steps(move_steps);
        let total = move_steps.unsigned_abs().min(u64::from(u32::MAX)) as u32;

        if total == 0 {
            return Self {
                ramp_steps_total,
                ..Self::zero()
            };
        }

        let (accel_steps, coast_steps, decel_steps, deceleration_start) =
            if ramp_index > ramp_steps_total {
                // slow to the new maximum, coast, then stop
                let down = ramp_index - ramp_steps_total;
                let coast = total.saturating_sub(down).saturating_sub(ramp_steps_total);
                (0, coast, total - coast, 0)
            } else {
                let headroom = ramp_steps_total - ramp_index;
                let accel = if headroom > 0 && u64::from(total) >= u64::from(ramp_index) + 2 {
                    headroom.min((total - ramp_index - 2) / 2 + 1)
                } else {
                    0
                };
                let peak = ramp_index + accel;
                let after = total - accel;
                let hold = after.saturating_sub(peak);
                if peak == ramp_steps_total {
                    (accel, hold, after - hold, accel + hold)
                } else {
                    // triangular: an odd leftover step is held at the apex
                    (accel, 0, after, accel)
                }
            };

        Self {
            total_steps: total,
            direction,
            start_ramp_index: ramp_index,
            accel_steps,
            coast_steps,
            decel_steps,
            deceleration_start,
            ramp_steps_total,
        }
    }

    /// Create a zero-length profile (no motion).
    pub fn zero() -> Self {
        Self::default()
    }

    /// Check if this is a zero-length profile.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.total_steps == 0
    }

    /// True when the move never reaches maximum speed.
    #[inline]
    pub fn is_triangular(&self) -> bool {
        !self.is_zero() && self.coast_steps == 0
    }

    /// Get the ramp state at a given step of the move.
    pub fn phase_at(&self, step: u32) -> RampState {
        if step >= self.total_steps {
            return RampState::Idle;
        }
        let coast_from = if self.start_ramp_index > self.ramp_steps_total {
            self.start_ramp_index - self.ramp_steps_total
        } else if step < self.accel_steps {
            return RampState::Accelerate;
        } else {
            self.accel_steps
        };
        if step >= coast_from && step - coast_from < self.coast_steps {
            RampState::Coast
        } else {
            RampState::Decelerate
        }
    }

    /// Estimate total duration of the move in seconds.
    ///
    /// Uses continuous constant-acceleration kinematics, so it is a close
    /// approximation of the discrete pulse train, not an exact sum.
    pub fn estimated_duration_secs(&self, max_speed: f32, acceleration: f32) -> f32 {
        if self.total_steps == 0 || max_speed <= 0.0 || acceleration <= 0.0 {
            return 0.0;
        }

        // Distance from rest: s = v² / 2a, so time t = sqrt(2s / a)
        let time_from_rest = |steps: u32| sqrtf(2.0 * steps as f32 / acceleration);

        let start = self.start_ramp_index.min(self.ramp_steps_total);
        let accel_time = time_from_rest(start + self.accel_steps) - time_from_rest(start);
        let coast_time = self.coast_steps as f32 / max_speed;
        let decel_time = if self.start_ramp_index > self.ramp_steps_total {
            let down = self.start_ramp_index - self.ramp_steps_total;
            let above = time_from_rest(self.start_ramp_index) - time_from_rest(self.ramp_steps_total);
            above + time_from_rest(self.decel_steps.saturating_sub(down))
        } else {
            time_from_rest(self.decel_steps)
        };

        accel_time + coast_time + decel_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trapezoidal_profile() {
        let profile = RampProfile::from_standstill(1000, 50);

        assert_eq!(profile.total_steps, 1000);
        assert_eq!(profile.direction, Direction::Clockwise);
        assert_eq!(profile.accel_steps, 50);
        assert_eq!(profile.coast_steps, 900);
        assert_eq!(profile.decel_steps, 50);
        assert_eq!(profile.deceleration_start, 950);
        assert!(!profile.is_triangular());
    }

    #[test]
    fn test_phases() {
        let profile = RampProfile::from_standstill(1000, 50);

        assert_eq!(profile.phase_at(0), RampState::Accelerate);
        assert_eq!(profile.phase_at(49), RampState::Accelerate);
        assert_eq!(profile.phase_at(50), RampState::Coast);
        assert_eq!(profile.phase_at(949), RampState::Coast);
        assert_eq!(profile.phase_at(950), RampState::Decelerate);
        assert_eq!(profile.phase_at(999), RampState::Decelerate);
        assert_eq!(profile.phase_at(1000), RampState::Idle);
    }

    #[test]
    fn test_exactly_twice_ramp() {
        let profile = RampProfile::from_standstill(100, 50);
        assert_eq!((profile.accel_steps, profile.coast_steps, profile.decel_steps), (50, 0, 50));
    }

    #[test]
    fn test_triangle_profile() {
        let even = RampProfile::from_standstill(40, 50);
        assert_eq!((even.accel_steps, even.coast_steps, even.decel_steps), (20, 0, 20));
        assert!(even.is_triangular());

        let odd = RampProfile::from_standstill(5, 50);
        assert_eq!((odd.accel_steps, odd.coast_steps, odd.decel_steps), (2, 0, 3));
        assert_eq!(odd.deceleration_start, 2);

        let single = RampProfile::from_standstill(1, 50);
        assert_eq!((single.accel_steps, single.coast_steps, single.decel_steps), (0, 0, 1));
    }

    #[test]
    fn test_direction() {
        let cw = RampProfile::from_standstill(100, 10);
        let ccw = RampProfile::from_standstill(-100, 10);

        assert_eq!(cw.direction, Direction::Clockwise);
        assert_eq!(ccw.direction, Direction::CounterClockwise);
        assert_eq!(cw.total_steps, ccw.total_steps);
        assert_eq!(Direction::CounterClockwise.sign(), -1);
        assert!(Direction::Clockwise.pin_level(false));
        assert!(!Direction::Clockwise.pin_level(true));
    }

    #[test]
    fn test_plan_from_speed() {
        // already 10 steps up the ramp, 30 to go
        let profile = RampProfile::plan(30, 10, 50);
        assert_eq!(profile.accel_steps, 10);
        assert_eq!(profile.decel_steps, 20);
        assert_eq!(profile.coast_steps, 0);

        // too fast for the new limit
        let profile = RampProfile::plan(100, 60, 50);
        assert_eq!(profile.accel_steps, 0);
        assert_eq!(profile.coast_steps, 40);
        assert_eq!(profile.decel_steps, 60);
        assert_eq!(profile.phase_at(0), RampState::Decelerate);
        assert_eq!(profile.phase_at(10), RampState::Coast);
        assert_eq!(profile.phase_at(50), RampState::Decelerate);
    }

    #[test]
    fn test_zero_profile() {
        let profile = RampProfile::from_standstill(0, 50);
        assert!(profile.is_zero());
        assert_eq!(profile.ramp_steps_total, 50);
        assert_eq!(profile.estimated_duration_secs(1000.0, 1000.0), 0.0);
    }

    #[test]
    fn test_estimated_duration() {
        // R = 50 at a = 1000: v_max = sqrt(2 * 1000 * 50) = 316 steps/s
        let profile = RampProfile::from_standstill(1000, 50);
        let secs = profile.estimated_duration_secs(316.2, 1000.0);
        // 0.316 s each ramp plus 900 / 316.2 s coasting
        assert!((secs - 3.478).abs() < 0.01);
    }
}
