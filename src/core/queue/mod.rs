use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};
use crate::core::clock::Deadline;
use crate::core::config::{ConfigError, QueueConfig};

/// Why an item was not inserted. The item is handed back either way.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InsertError<T> {
    /// Queue stayed full for the whole timeout.
    #[error("insert timed out on a full queue")]
    Timeout(T),
    /// Producer already used up its insertion budget.
    #[error("producer is done, insertion budget exhausted")]
    Done(T),
}

impl<T> InsertError<T> {
    /// Take back the item that was not inserted
    pub fn into_inner(self) -> T {
        match self {
            Self::Timeout(item) | Self::Done(item) => item,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RemoveError {
    /// Queue stayed empty for the whole timeout.
    #[error("remove timed out on an empty queue")]
    Timeout,
    /// Queue is empty and the producer is done; nothing will ever arrive.
    #[error("queue drained, producer is done")]
    Drained,
}

/// Everything the lock protects
#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    insert_count: usize,
    producer_done: bool,
}

/// Bounded FIFO handing items from one producer to one consumer.
///
/// One mutex guards all state. `space_available` is signalled when a remove
/// takes the queue from full to `capacity - 1`, `item_available` when an
/// insert takes it from empty to one item. Both sides re-check their
/// predicate after every wake.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    space_available: Condvar,
    item_available: Condvar,
    capacity: usize,
    insert_limit: Option<usize>,
    // mirrors `State::producer_done` for the lock-free advisory read
    done_hint: AtomicBool,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue with no insertion budget.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, None)
    }

    /// Create an empty queue whose producer is done after `limit` insertions.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_insert_limit(capacity: usize, limit: usize) -> Self {
        Self::build(capacity, Some(limit))
    }

    pub fn from_config(config: &QueueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config.capacity, config.insert_limit))
    }

    fn build(capacity: usize, insert_limit: Option<usize>) -> Self {
        // --- Negative-space assertion: a zero-slot queue can never make progress ---
        assert!(capacity > 0, "Queue capacity must be greater than zero");
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                insert_count: 0,
                producer_done: false,
            }),
            space_available: Condvar::new(),
            item_available: Condvar::new(),
            capacity,
            insert_limit,
            done_hint: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn insert_limit(&self) -> Option<usize> {
        self.insert_limit
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Number of items inserted so far
    pub fn insert_count(&self) -> usize {
        self.lock().insert_count
    }

    /// Advisory read without the lock; confirm emptiness with [`len`](Self::len).
    pub fn is_producer_done(&self) -> bool {
        self.done_hint.load(Ordering::Acquire)
    }

    /// Insert at the back, waiting while the queue is full.
    ///
    /// `None` waits indefinitely. The insertion budget is checked before any
    /// waiting: once spent, the producer is marked done and the item is
    /// rejected with [`InsertError::Done`]. A timeout leaves the queue
    /// untouched.
    pub fn insert(&self, item: T, timeout: Option<Duration>) -> Result<(), InsertError<T>> {
        let deadline = Deadline::from_timeout(timeout);
        let mut state = self.lock();
        trace!("insert: acquired lock");

        if state.producer_done || self.budget_spent(&state) {
            self.set_done(&mut state);
            debug!(insert_count = state.insert_count, "insert: producer done, item rejected");
            return Err(InsertError::Done(item));
        }

        while state.items.len() == self.capacity {
            debug!(capacity = self.capacity, "insert: queue is full");
            let (guard, timed_out) = self.wait(&self.space_available, state, deadline);
            state = guard;
            if timed_out && state.items.len() == self.capacity {
                debug!("insert: timeout");
                return Err(InsertError::Timeout(item));
            }
        }

        state.items.push_back(item);
        state.insert_count += 1;

        // --- Negative-space assertion: capacity invariant ---
        assert!(state.items.len() <= self.capacity, "Queue must never exceed its capacity");

        if state.items.len() == 1 {
            self.item_available.notify_one();
            trace!("insert: signalled item available");
        }
        debug!(len = state.items.len(), insert_count = state.insert_count, "insert: item inserted");
        Ok(())
    }

    /// Remove from the front, waiting while the queue is empty.
    ///
    /// `None` waits indefinitely, unless the producer is done, in which case an
    /// empty queue yields [`RemoveError::Drained`]. A timeout leaves the queue
    /// untouched.
    pub fn remove(&self, timeout: Option<Duration>) -> Result<T, RemoveError> {
        let deadline = Deadline::from_timeout(timeout);
        let mut state = self.lock();
        trace!("remove: acquired lock");

        loop {
            if let Some(item) = state.items.pop_front() {
                if state.items.len() == self.capacity - 1 {
                    self.space_available.notify_one();
                    trace!("remove: signalled space available");
                }
                debug!(len = state.items.len(), "remove: item removed");
                return Ok(item);
            }

            if state.producer_done {
                debug!("remove: queue drained");
                return Err(RemoveError::Drained);
            }

            debug!("remove: queue is empty");
            let (guard, timed_out) = self.wait(&self.item_available, state, deadline);
            state = guard;
            if timed_out && state.items.is_empty() {
                debug!("remove: timeout");
                return Err(RemoveError::Timeout);
            }
        }
    }

    /// Signal that no further insertions will happen. Wakes a consumer
    /// blocked on an empty queue. Idempotent.
    pub fn mark_producer_done(&self) {
        let mut state = self.lock();
        self.set_done(&mut state);
    }

    fn set_done(&self, state: &mut State<T>) {
        if !state.producer_done {
            state.producer_done = true;
            self.done_hint.store(true, Ordering::Release);
            self.item_available.notify_all();
            debug!(insert_count = state.insert_count, "producer marked done");
        }
    }

    fn budget_spent(&self, state: &State<T>) -> bool {
        self.insert_limit.is_some_and(|limit| state.insert_count >= limit)
    }

    // Mutations never panic half-way, so a poisoned guard still holds consistent state
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait once on `condvar`. Returns `true` alongside the guard when the
    /// deadline has passed; callers re-check their predicate either way.
    fn wait<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, State<T>>,
        deadline: Option<Deadline>,
    ) -> (MutexGuard<'a, State<T>>, bool) {
        match deadline {
            None => (condvar.wait(guard).unwrap_or_else(PoisonError::into_inner), false),
            Some(deadline) => match deadline.remaining() {
                None => (guard, true),
                Some(left) => {
                    let (guard, result) = condvar
                        .wait_timeout(guard, left)
                        .unwrap_or_else(PoisonError::into_inner);
                    (guard, result.timed_out())
                }
            },
        }
    }
}

/// Queue shared between the producer, the consumer and the coordinator
pub type SafeQueue<T> = Arc<BoundedQueue<T>>;
