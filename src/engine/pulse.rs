//! Interrupt-side consumer.
//!
//! [`PulseGenerator::on_compare_interrupt`] is what a board's compare ISR
//! calls. Per event it emits at most one pulse, pops at most one entry and
//! re-arms the timer once. It never blocks, allocates or logs.

use crate::config::MAX_STEPPER;
use crate::hal::PulseTimer;
use crate::queue::QueueConsumer;

/// What a compare event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseEvent {
    /// Emitted a pulse; the current entry has more.
    Pulse,
    /// Started the next entry (after the last pulse of the previous one, if
    /// any).
    Loaded,
    /// Queue empty; the channel is stopped and the timer not re-armed.
    Starved,
    /// No queue is attached to this channel.
    Unassigned,
}

/// Entry being executed.
#[derive(Debug, Clone, Copy)]
struct Active {
    delta_ticks: u32,
    steps_left: u8,
}

struct Channel<'q, const Q: usize> {
    consumer: QueueConsumer<'q, Q>,
    active: Option<Active>,
    /// Level last written to the direction pin.
    direction_level: Option<bool>,
    /// Producer's direction epoch when `direction_level` was written.
    direction_epoch: u8,
}

/// Consumer halves of every channel's queue.
pub struct PulseGenerator<'q, const Q: usize> {
    channels: [Option<Channel<'q, Q>>; MAX_STEPPER],
}

impl<'q, const Q: usize> PulseGenerator<'q, Q> {
    pub(crate) fn new() -> Self {
        Self {
            channels: core::array::from_fn(|_| None),
        }
    }

    pub(crate) fn attach(&mut self, channel: usize, consumer: QueueConsumer<'q, Q>) {
        if let Some(slot) = self.channels.get_mut(channel) {
            let direction_epoch = consumer.direction_epoch();
            *slot = Some(Channel {
                consumer,
                active: None,
                direction_level: None,
                direction_epoch,
            });
        }
    }

    /// Handle `channel`'s compare event.
    pub fn on_compare_interrupt<T: PulseTimer>(&mut self, timer: &mut T, channel: u8) -> PulseEvent {
        let Some(ch) = self
            .channels
            .get_mut(usize::from(channel))
            .and_then(Option::as_mut)
        else {
            return PulseEvent::Unassigned;
        };

        if let Some(active) = ch.active.as_mut() {
            if active.steps_left > 0 {
                timer.step_pulse(channel);
                active.steps_left -= 1;
            }
            if active.steps_left > 0 {
                timer.arm_compare_interrupt(channel, active.delta_ticks);
                return PulseEvent::Pulse;
            }
            ch.active = None;
        }

        let Some(command) = ch.consumer.pop() else {
            ch.consumer.mark_stopped();
            return PulseEvent::Starved;
        };

        let epoch = ch.consumer.direction_epoch();
        if epoch != ch.direction_epoch {
            ch.direction_level = None;
            ch.direction_epoch = epoch;
        }
        if !command.is_pause() {
            let level = ch.consumer.direction_level(&command);
            if ch.direction_level != Some(level) {
                if let Some(pin) = ch.consumer.direction_pin() {
                    timer.write_direction(pin, level);
                }
                ch.direction_level = Some(level);
            }
        }

        ch.active = Some(Active {
            delta_ticks: command.start_delta_ticks(),
            steps_left: command.steps(),
        });
        timer.arm_compare_interrupt(channel, command.start_delta_ticks());
        PulseEvent::Loaded
    }

    /// True while `channel` has an entry in progress.
    pub fn is_active(&self, channel: u8) -> bool {
        self.channels
            .get(usize::from(channel))
            .and_then(Option::as_ref)
            .map_or(false, |ch| ch.active.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{StepCommand, StepQueue};

    #[derive(Default)]
    struct Recorder {
        armed: std::vec::Vec<(u8, u32)>,
        pulses: u32,
        dir_writes: std::vec::Vec<(u8, bool)>,
    }

    impl PulseTimer for Recorder {
        fn arm_compare_interrupt(&mut self, channel: u8, delta_ticks: u32) {
            self.armed.push((channel, delta_ticks));
        }

        fn step_pulse(&mut self, _channel: u8) {
            self.pulses += 1;
        }

        fn write_direction(&mut self, pin: u8, high: bool) {
            self.dir_writes.push((pin, high));
        }
    }

    #[test]
    fn test_burst_and_starve() {
        let mut queue: StepQueue<8> = StepQueue::new();
        let (mut tx, rx) = queue.split();
        tx.set_direction_pin(Some(4));
        tx.try_push(StepCommand::planned(1000, 3, true)).unwrap();
        tx.mark_running();

        let mut gen = PulseGenerator::new();
        gen.attach(0, rx);
        let mut timer = Recorder::default();

        assert_eq!(gen.on_compare_interrupt(&mut timer, 0), PulseEvent::Loaded);
        assert_eq!(timer.dir_writes, [(4, true)]);
        assert_eq!(gen.on_compare_interrupt(&mut timer, 0), PulseEvent::Pulse);
        assert_eq!(gen.on_compare_interrupt(&mut timer, 0), PulseEvent::Pulse);
        assert_eq!(gen.on_compare_interrupt(&mut timer, 0), PulseEvent::Starved);
        assert_eq!(timer.pulses, 3);
        assert_eq!(timer.armed, [(0, 1000), (0, 1000), (0, 1000)]);
        assert!(!tx.is_consumer_running());
        assert!(!gen.is_active(0));
    }

    #[test]
    fn test_direction_written_on_change_only() {
        let mut queue: StepQueue<8> = StepQueue::new();
        let (mut tx, rx) = queue.split();
        tx.set_direction_pin(Some(2));
        tx.try_push(StepCommand::planned(500, 1, false)).unwrap();
        tx.try_push(StepCommand::planned(500, 1, false)).unwrap();
        tx.try_push(StepCommand::pause(500, true)).unwrap();
        tx.try_push(StepCommand::planned(500, 1, true)).unwrap();

        let mut gen = PulseGenerator::new();
        gen.attach(1, rx);
        let mut timer = Recorder::default();
        while gen.on_compare_interrupt(&mut timer, 1) != PulseEvent::Starved {}

        assert_eq!(timer.dir_writes, [(2, false), (2, true)]);
        assert_eq!(timer.pulses, 3);
    }

    #[test]
    fn test_new_direction_pin_gets_rewritten() {
        let mut queue: StepQueue<8> = StepQueue::new();
        let (mut tx, rx) = queue.split();
        tx.set_direction_pin(Some(11));
        tx.set_direction_inverted(true);
        tx.try_push(StepCommand::planned(500, 1, true)).unwrap();

        let mut gen = PulseGenerator::new();
        gen.attach(0, rx);
        let mut timer = Recorder::default();
        while gen.on_compare_interrupt(&mut timer, 0) != PulseEvent::Starved {}
        assert_eq!(timer.dir_writes, [(11, false)]);

        // same logical direction, new pin and polarity
        tx.set_direction_pin(Some(12));
        tx.set_direction_inverted(false);
        tx.try_push(StepCommand::planned(500, 1, true)).unwrap();
        while gen.on_compare_interrupt(&mut timer, 0) != PulseEvent::Starved {}
        assert_eq!(timer.dir_writes, [(11, false), (12, true)]);

        tx.set_direction_pin(None);
        tx.try_push(StepCommand::planned(500, 1, false)).unwrap();
        while gen.on_compare_interrupt(&mut timer, 0) != PulseEvent::Starved {}
        assert_eq!(timer.dir_writes.len(), 2);
        assert_eq!(timer.pulses, 3);
    }

    #[test]
    fn test_unassigned_channel() {
        let mut gen: PulseGenerator<'_, 8> = PulseGenerator::new();
        let mut timer = Recorder::default();
        assert_eq!(gen.on_compare_interrupt(&mut timer, 0), PulseEvent::Unassigned);
        assert_eq!(gen.on_compare_interrupt(&mut timer, 200), PulseEvent::Unassigned);
    }
}
