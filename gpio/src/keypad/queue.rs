use std::collections::VecDeque;
use std::collections::TryReserveError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use crate::keypad::KeyEvent;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum QueueError {
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
    #[error("could not allocate the event queue: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Bounded FIFO of key events between the scanning thread and the consumer.
///
/// The producer never blocks: when the queue is full the new event is dropped and counted.
/// The consumer blocks until an event arrives or its timeout runs out.
#[derive(Debug)]
pub struct EventQueue {
    events: Mutex<VecDeque<KeyEvent>>,
    available: Condvar,
    capacity: usize,
    overflows: AtomicU32,
}

impl EventQueue {
    /// Default number of events the queue holds.
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Creates a queue holding at most `capacity` events. The whole buffer is allocated up front.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        let mut events = VecDeque::new();
        events.try_reserve_exact(capacity)?;
        Ok(EventQueue {
            events: Mutex::new(events),
            available: Condvar::new(),
            capacity,
            overflows: AtomicU32::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events waiting to be consumed.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// How many events were dropped because the queue was full.
    pub fn overflow_count(&self) -> u32 {
        self.overflows.load(Ordering::Relaxed)
    }

    pub fn reset_overflow_count(&self) {
        self.overflows.store(0, Ordering::Relaxed);
    }

    /// Appends the event without blocking.
    ///
    /// Returns `false` and counts an overflow if the queue is full.
    pub fn try_enqueue(&self, event: KeyEvent) -> bool {
        let mut events = self.lock();
        if events.len() >= self.capacity {
            drop(events);
            self.overflows.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        events.push_back(event);
        drop(events);
        self.available.notify_one();
        true
    }

    /// Takes the oldest event, waiting up to `timeout` for one to arrive.
    pub fn dequeue(&self, timeout: Duration) -> Option<KeyEvent> {
        let events = self.lock();
        let (mut events, _) = self
            .available
            .wait_timeout_while(events, timeout, |events| events.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        events.pop_front()
    }

    // Poisoning is ignored: no holder leaves the deque half-modified.
    fn lock(&self) -> MutexGuard<'_, VecDeque<KeyEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
