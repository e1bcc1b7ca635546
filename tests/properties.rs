//! Property tests for the step queue and the ramp generator.

use std::collections::VecDeque;

use proptest::prelude::*;

use stepper_pulse::motion::{RampGenerator, RampParameters};
use stepper_pulse::{Direction, Platform, QueueError, RampProfile, RampState, StepCommand, StepQueue};

#[derive(Debug, Clone)]
enum Op {
    Push(u32, u8, bool),
    Pop,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (320u32..100_000, 1u8..=255, any::<bool>()).prop_map(|(d, s, up)| Op::Push(d, s, up)),
        Just(Op::Pop),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn queue_matches_fifo_model(ops in prop::collection::vec(op(), 0..400)) {
        let mut queue: StepQueue<16> = StepQueue::new();
        let (mut tx, mut rx) = queue.split();
        let mut model: VecDeque<StepCommand> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(delta, steps, up) => {
                    let cmd = StepCommand::new(delta, steps, up, 320).unwrap();
                    let pushed = tx.try_push(cmd);
                    if model.len() == 15 {
                        prop_assert_eq!(pushed, Err(QueueError::Full));
                    } else {
                        prop_assert_eq!(pushed, Ok(()));
                        model.push_back(cmd);
                    }
                }
                Op::Pop => prop_assert_eq!(rx.pop(), model.pop_front()),
            }
            prop_assert_eq!(tx.len(), model.len());
            prop_assert_eq!(tx.is_full(), model.len() == 15);
            prop_assert_eq!(tx.is_empty(), model.is_empty());
            prop_assert!(tx.pending().eq(model.iter().copied()));
        }
    }

    #[test]
    fn standstill_profile_partitions_the_move(steps in -100_000i64..100_000, ramp in 1u32..5_000) {
        let profile = RampProfile::from_standstill(steps, ramp);
        let total = steps.unsigned_abs() as u32;

        prop_assert_eq!(profile.total_steps, total);
        prop_assert_eq!(profile.accel_steps + profile.coast_steps + profile.decel_steps, total);
        prop_assert!(profile.accel_steps <= ramp);
        prop_assert!(profile.accel_steps <= profile.decel_steps);
        prop_assert!(profile.decel_steps <= profile.accel_steps + 1 || profile.coast_steps > 0);
        prop_assert_eq!(profile.deceleration_start, profile.accel_steps + profile.coast_steps);
        if total >= 2 * ramp {
            prop_assert_eq!(profile.accel_steps, ramp);
            prop_assert_eq!(profile.decel_steps, ramp);
        } else {
            prop_assert_eq!(profile.coast_steps, 0);
        }
        if steps < 0 {
            prop_assert_eq!(profile.direction, Direction::CounterClockwise);
        }
    }

    #[test]
    fn generator_reaches_any_target(
        target in -3_000i32..3_000,
        start in -1_000i32..1_000,
        min_step_us in 40u32..5_000,
        accel in 100u32..200_000,
    ) {
        let platform = Platform::host();
        let params = RampParameters::compute(min_step_us, accel, &platform).unwrap();
        let mut gen = RampGenerator::new();
        gen.start_move(params, target, start);

        let mut position = start;
        let mut pulses = 0u32;
        while let Some(step) = gen.next_step(position) {
            prop_assert!(step.delta_ticks >= params.min_travel_ticks);
            prop_assert_eq!(step.direction, Direction::from_steps(i64::from(target - start)));
            position += step.direction.sign() * i32::from(step.steps);
            pulses += u32::from(step.steps);
            prop_assert!(pulses <= 6_000);
        }

        prop_assert_eq!(position, target);
        prop_assert_eq!(pulses, target.abs_diff(start));
        prop_assert!(gen.is_idle());
        prop_assert_eq!(gen.state(), RampState::Idle);
    }

    #[test]
    fn stop_never_overshoots_the_ramp(
        target in 200i32..3_000,
        planned in 1usize..150,
        accel in 500u32..50_000,
    ) {
        let params = RampParameters::compute(200, accel, &Platform::host()).unwrap();
        let mut gen = RampGenerator::new();
        gen.start_move(params, target, 0);

        let mut position = 0i32;
        for _ in 0..planned {
            match gen.next_step(position) {
                Some(step) => position += step.direction.sign() * i32::from(step.steps),
                None => break,
            }
        }
        let ramp_index = gen.performed_ramp_up_steps();
        let at_stop = position;
        gen.stop(Some(params), position);

        while let Some(step) = gen.next_step(position) {
            prop_assert_eq!(step.state, RampState::DecelerateToStop);
            position += step.direction.sign() * i32::from(step.steps);
        }
        prop_assert_eq!(position, at_stop + ramp_index as i32);
        prop_assert!(position <= target.max(at_stop));
        prop_assert_eq!(gen.target(), position);
    }
}
