//! Lock-free SPSC ring buffer.
//!
//! # Ordering contract
//!
//! - Only the [`QueueProducer`] writes slots and stores `tail`.
//! - Only the [`QueueConsumer`] stores `head`.
//! - The producer writes the slot at `tail`, then publishes with a `Release`
//!   store of `tail`. The consumer loads `tail` with `Acquire` before reading
//!   the slot.
//! - The consumer copies the slot at `head` out, then publishes with a
//!   `Release` store of `head`. The producer loads `head` with `Acquire`
//!   before deciding a slot is free.
//!
//! `full <=> (tail + 1) mod N == head`, `empty <=> head == tail`, so one slot
//! is always left unused. Indices are `u8`, which every supported target
//! loads and stores atomically; no interrupt-free section is required.

#![allow(unsafe_code)]

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::error::QueueError;

use super::command::StepCommand;

/// Queue length used by the engine unless told otherwise.
pub const DEFAULT_QUEUE_LEN: usize = 32;

const NO_PIN: u8 = 0xff;

/// Fixed-capacity ring of step commands shared by two execution contexts.
///
/// `N` must be a power of two between 2 and 256; the queue holds `N - 1`
/// entries.
pub struct StepQueue<const N: usize> {
    slots: [UnsafeCell<StepCommand>; N],
    head: AtomicU8,
    tail: AtomicU8,
    /// Set by the producer when it starts the channel, cleared by the
    /// consumer when it finds the ring empty.
    running: AtomicBool,
    dir_pin: AtomicU8,
    dir_inverted: AtomicBool,
    /// Bumped by the producer whenever pin or polarity change.
    dir_epoch: AtomicU8,
}

// SAFETY: slot access is partitioned by the head/tail protocol described in
// the module docs; `split` hands out exactly one producer and one consumer.
unsafe impl<const N: usize> Sync for StepQueue<N> {}

impl<const N: usize> StepQueue<N> {
    const CAPACITY_CHECK: () = assert!(
        N.is_power_of_two() && N >= 2 && N <= 256,
        "StepQueue length must be a power of two in 2..=256"
    );
    const MASK: u8 = (N - 1) as u8;
    #[allow(clippy::declare_interior_mutable_const)]
    const EMPTY_SLOT: UnsafeCell<StepCommand> = UnsafeCell::new(StepCommand::EMPTY);

    /// Create an empty queue.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;
        Self {
            slots: [Self::EMPTY_SLOT; N],
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
            running: AtomicBool::new(false),
            dir_pin: AtomicU8::new(NO_PIN),
            dir_inverted: AtomicBool::new(false),
            dir_epoch: AtomicU8::new(0),
        }
    }

    /// Number of entries the queue can hold.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Split into the producer and consumer halves.
    ///
    /// The exclusive borrow guarantees there is only ever one of each.
    pub fn split(&mut self) -> (QueueProducer<'_, N>, QueueConsumer<'_, N>) {
        let queue: &Self = self;
        (QueueProducer { queue }, QueueConsumer { queue })
    }

    #[inline]
    fn next(index: u8) -> u8 {
        index.wrapping_add(1) & Self::MASK
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }
}

impl<const N: usize> Default for StepQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Foreground half: pushes entries and owns `tail`.
pub struct QueueProducer<'a, const N: usize> {
    queue: &'a StepQueue<N>,
}

impl<'a, const N: usize> QueueProducer<'a, N> {
    /// Append an entry.
    ///
    /// # Errors
    ///
    /// [`QueueError::Full`] when no slot is free; the queue is unchanged.
    pub fn try_push(&mut self, command: StepCommand) -> Result<(), QueueError> {
        let q = self.queue;
        let tail = q.tail.load(Ordering::Relaxed);
        let next = StepQueue::<N>::next(tail);
        if next == q.head.load(Ordering::Acquire) {
            return Err(QueueError::Full);
        }
        // SAFETY: `tail` is not visible to the consumer until the store
        // below, and only this producer writes slots.
        unsafe { *q.slots[usize::from(tail)].get() = command };
        q.tail.store(next, Ordering::Release);
        Ok(())
    }

    /// True if the next push would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        let q = self.queue;
        StepQueue::<N>::next(q.tail.load(Ordering::Relaxed)) == q.head.load(Ordering::Acquire)
    }

    /// True if every pushed entry has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Entries pushed but not yet popped.
    #[inline]
    pub fn len(&self) -> usize {
        let q = self.queue;
        let head = q.head.load(Ordering::Acquire);
        let tail = q.tail.load(Ordering::Relaxed);
        usize::from(tail.wrapping_sub(head) & StepQueue::<N>::MASK)
    }

    /// Number of entries the queue can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Iterate entries not yet popped, oldest first.
    ///
    /// The consumer may pop while this runs; the snapshot then includes
    /// entries it has already taken, never ones it has not.
    pub fn pending(&self) -> Pending<'_, N> {
        let q = self.queue;
        Pending {
            queue: q,
            index: q.head.load(Ordering::Acquire),
            tail: q.tail.load(Ordering::Relaxed),
        }
    }

    /// True while the consumer is processing entries.
    #[inline]
    pub fn is_consumer_running(&self) -> bool {
        self.queue.running.load(Ordering::Acquire)
    }

    /// Record that the channel has been started.
    #[inline]
    pub(crate) fn mark_running(&mut self) {
        self.queue.running.store(true, Ordering::Release);
    }

    /// Publish the direction pin for the consumer.
    pub(crate) fn set_direction_pin(&mut self, pin: Option<u8>) {
        self.queue.dir_pin.store(pin.unwrap_or(NO_PIN), Ordering::Release);
        self.bump_direction_epoch();
    }

    /// Swap the direction pin level written for every entry.
    pub(crate) fn set_direction_inverted(&mut self, inverted: bool) {
        self.queue.dir_inverted.store(inverted, Ordering::Release);
        self.bump_direction_epoch();
    }

    fn bump_direction_epoch(&mut self) {
        // sole writer, so load + store is enough
        let epoch = self.queue.dir_epoch.load(Ordering::Relaxed);
        self.queue.dir_epoch.store(epoch.wrapping_add(1), Ordering::Release);
    }
}

/// Snapshot iterator over pending entries.
pub struct Pending<'a, const N: usize> {
    queue: &'a StepQueue<N>,
    index: u8,
    tail: u8,
}

impl<'a, const N: usize> Iterator for Pending<'a, N> {
    type Item = StepCommand;

    fn next(&mut self) -> Option<StepCommand> {
        if self.index == self.tail {
            return None;
        }
        // SAFETY: slots between head and tail are written only by the
        // producer, which holds the shared borrow this iterator came from.
        let command = unsafe { *self.queue.slots[usize::from(self.index)].get() };
        self.index = StepQueue::<N>::next(self.index);
        Some(command)
    }
}

/// Interrupt half: pops entries and owns `head`.
pub struct QueueConsumer<'a, const N: usize> {
    queue: &'a StepQueue<N>,
}

impl<'a, const N: usize> QueueConsumer<'a, N> {
    /// Take the oldest entry, if any.
    pub fn pop(&mut self) -> Option<StepCommand> {
        let q = self.queue;
        let head = q.head.load(Ordering::Relaxed);
        if head == q.tail.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: the Acquire load of `tail` above makes the producer's
        // write of this slot visible, and the producer will not reuse it
        // until `head` moves past it.
        let command = unsafe { *q.slots[usize::from(head)].get() };
        q.head.store(StepQueue::<N>::next(head), Ordering::Release);
        Some(command)
    }

    /// True if there is nothing to pop.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Record that the channel stopped for lack of entries.
    #[inline]
    pub(crate) fn mark_stopped(&mut self) {
        self.queue.running.store(false, Ordering::Release);
    }

    /// Direction pin published by the producer.
    #[inline]
    pub fn direction_pin(&self) -> Option<u8> {
        match self.queue.dir_pin.load(Ordering::Acquire) {
            NO_PIN => None,
            pin => Some(pin),
        }
    }

    /// Counter that moves whenever the producer changes the direction pin
    /// or polarity.
    #[inline]
    pub fn direction_epoch(&self) -> u8 {
        self.queue.dir_epoch.load(Ordering::Acquire)
    }

    /// Pin level for an entry's direction.
    #[inline]
    pub fn direction_level(&self, command: &StepCommand) -> bool {
        command.direction_high() != self.queue.dir_inverted.load(Ordering::Acquire)
    }
}
