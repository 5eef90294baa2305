//! Bounded blocking work queue
//!
//! A fixed-capacity ring buffer shared by one producer and many consumers.
//! All state (slots, head, tail, length and the closed flag) sits behind a
//! single mutex; `not_full` wakes a producer waiting for space and
//! `not_empty` wakes consumers waiting for an item or for the queue to
//! close. Termination is the conjunction "empty AND closed", evaluated only
//! while holding the mutex.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Returned by [`BoundedQueue::push`] when the queue was already closed
#[derive(Debug, PartialEq, Eq)]
pub struct QueueClosed<T>(pub T);

struct QueueState<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    len: usize,
    closed: bool,
}

impl<T> QueueState<T> {
    fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }
}

/// Fixed-capacity blocking FIFO queue
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                slots: (0..capacity).map(|_| None).collect(),
                head: 0,
                tail: 0,
                len: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    // Every critical section leaves the state consistent, so a panic in
    // another holder does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item, blocking while the queue is full.
    ///
    /// Fails, handing the item back, if the queue has been closed.
    pub fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.lock();
        while state.is_full() && !state.closed {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.closed {
            return Err(QueueClosed(item));
        }

        let tail = state.tail;
        state.slots[tail] = Some(item);
        state.tail = (tail + 1) % state.slots.len();
        state.len += 1;
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the oldest item, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is empty and closed.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        while state.len == 0 && !state.closed {
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.len == 0 {
            return None;
        }

        let head = state.head;
        let item = state.slots[head].take();
        state.head = (head + 1) % state.slots.len();
        state.len -= 1;
        drop(state);

        self.not_full.notify_one();
        item
    }

    /// Signal that no more items will be pushed.
    ///
    /// Idempotent. Wakes every blocked consumer so they can drain the
    /// remaining items and exit.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        self.lock().len
    }

    /// Whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued items
    pub fn capacity(&self) -> usize {
        self.lock().slots.len()
    }
}
