//! Bounded command queue between API callers and the bus task.
//!
//! The queue is the only producer/consumer handoff in the subsystem:
//! foreground callers enqueue envelopes, the single transaction executor
//! drains them. Enqueue never blocks: a full queue drops the command with
//! [`QueueError::Full`] and the caller just logs it.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use vfd_common::consts::QUEUE_CAPACITY;

use crate::error::QueueError;
use crate::frame::CommandEnvelope;

/// Fixed-capacity FIFO of command envelopes.
pub struct CommandQueue {
    inner: Mutex<VecDeque<CommandEnvelope>>,
    available: Condvar,
    capacity: usize,
}

impl CommandQueue {
    /// Create a queue with the system default capacity.
    pub fn new() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    /// Create a queue with an explicit capacity (tests use small ones).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Hand an envelope to the bus task without blocking.
    ///
    /// # Errors
    /// Returns `QueueError::Full` when the queue is at capacity; the
    /// envelope is dropped.
    pub fn enqueue(&self, envelope: CommandEnvelope) -> Result<(), QueueError> {
        let mut queue = self.inner.lock().expect("command queue lock poisoned");
        if queue.len() >= self.capacity {
            return Err(QueueError::Full);
        }
        queue.push_back(envelope);
        self.available.notify_one();
        Ok(())
    }

    /// Take the oldest envelope, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` on timeout so the executor can fall back to its
    /// polling cycle. `Duration::ZERO` is a pure try-dequeue.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<CommandEnvelope> {
        let mut queue = self.inner.lock().expect("command queue lock poisoned");
        if queue.is_empty() && !timeout.is_zero() {
            let (guard, _result) = self
                .available
                .wait_timeout_while(queue, timeout, |q| q.is_empty())
                .expect("command queue lock poisoned");
            queue = guard;
        }
        queue.pop_front()
    }

    /// Discard all pending envelopes; returns how many were dropped.
    ///
    /// Used before a Disable mode command so stale RPM changes queued
    /// behind it cannot fire after the spindle is told to stop.
    pub fn clear(&self) -> usize {
        let mut queue = self.inner.lock().expect("command queue lock poisoned");
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    /// Number of pending envelopes.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("command queue lock poisoned").len()
    }

    /// True when no envelope is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
