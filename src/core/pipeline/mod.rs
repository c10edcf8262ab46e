pub use crate::core::{
    queue::{BoundedQueue, SafeQueue, InsertError, RemoveError},
    log::{LogEntry, Logger, SafeLogger, Role},
    event::Event,
    config::{ConfigError, QueueConfig},
};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error running a producer/consumer pair.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The OS refused to start a task thread.
    #[error("failed to spawn {role:?} thread: {source}")]
    Spawn {
        role: Role,
        #[source]
        source: std::io::Error,
    },
    /// A task thread panicked before reporting.
    #[error("{0:?} task panicked")]
    TaskPanicked(Role),
}

/// What a task returns when it stops
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskReport {
    pub role: Role,
    pub code: i32,
    /// Items this task moved into or out of the queue
    pub transferred: usize,
}

#[derive(Clone, Debug)]
pub struct PipelineReport<T> {
    pub producer: TaskReport,
    pub consumer: TaskReport,
    pub logs: Vec<LogEntry<T>>,
}

impl<T: Clone> PipelineReport<T> {
    /// Values the consumer removed, in removal order
    pub fn consumed(&self) -> Vec<T> {
        self.logs
            .iter()
            .filter(|entry| entry.role == Role::Consumer && entry.event.is_transfer())
            .filter_map(|entry| entry.event.item.clone())
            .collect()
    }
}

fn record<T>(logger: &SafeLogger<T>, role: Role, event: Event<T>) {
    logger.lock().unwrap_or_else(PoisonError::into_inner).log(role, event);
}

/// Feed `items` into the queue until they run out or the budget is spent.
///
/// A timed-out insert is logged and the same item retried. Running out of
/// items marks the producer done.
pub fn run_producer<T, I>(
    queue: &BoundedQueue<T>,
    logger: &SafeLogger<T>,
    items: I,
    timeout: Option<Duration>,
    code: i32,
) -> TaskReport
where
    T: Clone + Debug,
    I: IntoIterator<Item = T>,
{
    let mut inserted = 0;
    for item in items {
        loop {
            match queue.insert(item.clone(), timeout) {
                Ok(()) => {
                    debug!(item = ?item, "producer: inserted");
                    record(logger, Role::Producer, Event::inserted(item, queue.len()));
                    inserted += 1;
                    break;
                }
                Err(InsertError::Timeout(_)) => {
                    warn!(item = ?item, "producer: insert timed out, retrying");
                    record(logger, Role::Producer, Event::insert_timed_out(item.clone(), queue.len()));
                }
                Err(InsertError::Done(_)) => {
                    record(logger, Role::Producer, Event::rejected(item, queue.len()));
                    info!(inserted, code, "producer: done");
                    return TaskReport { role: Role::Producer, code, transferred: inserted };
                }
            }
        }
    }

    queue.mark_producer_done();
    info!(inserted, code, "producer: input exhausted");
    TaskReport { role: Role::Producer, code, transferred: inserted }
}

/// Drain the queue until the producer is done and nothing is left.
pub fn run_consumer<T>(
    queue: &BoundedQueue<T>,
    logger: &SafeLogger<T>,
    timeout: Option<Duration>,
    code: i32,
) -> TaskReport
where
    T: Clone + Debug,
{
    let mut removed = 0;
    loop {
        match queue.remove(timeout) {
            Ok(item) => {
                info!(item = ?item, "consumer: removed");
                record(logger, Role::Consumer, Event::removed(item, queue.len()));
                removed += 1;
            }
            Err(RemoveError::Timeout) => {
                debug!("consumer: remove timed out");
                record(logger, Role::Consumer, Event::remove_timed_out(queue.len()));
            }
            Err(RemoveError::Drained) => {
                record(logger, Role::Consumer, Event::drained());
            }
        }

        // Done flag first, then emptiness under the lock
        if queue.is_producer_done() && queue.len() == 0 {
            break;
        }
    }

    info!(removed, code, "consumer: done");
    TaskReport { role: Role::Consumer, code, transferred: removed }
}

/// Owns a queue and its log, and runs one producer and one consumer over it
pub struct Pipeline<T> {
    queue: SafeQueue<T>,
    logger: SafeLogger<T>,
    config: QueueConfig,
}

impl<T: Clone + Debug + Send + 'static> Pipeline<T> {
    pub fn new(config: QueueConfig) -> Result<Self, PipelineError> {
        let queue = BoundedQueue::from_config(&config)?;
        Ok(Self {
            queue: Arc::new(queue),
            logger: Arc::new(Mutex::new(Logger::new())),
            config,
        })
    }

    pub fn queue(&self) -> &SafeQueue<T> {
        &self.queue
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Run both tasks to completion over `items`.
    ///
    /// Returns only after both threads have been joined.
    pub fn run<I>(self, items: I) -> Result<PipelineReport<T>, PipelineError>
    where
        I: IntoIterator<Item = T> + Send + 'static,
    {
        let timeout = self.config.timeout();
        info!(
            capacity = self.queue.capacity(),
            insert_limit = ?self.queue.insert_limit(),
            timeout_ms = ?self.config.timeout_ms,
            "pipeline: starting"
        );

        // Consumer first: if the producer cannot start, marking done releases it
        let consumer = {
            let queue = Arc::clone(&self.queue);
            let logger = Arc::clone(&self.logger);
            let code = self.config.consumer_code;
            thread::Builder::new()
                .name("consumer".into())
                .spawn(move || run_consumer(&queue, &logger, timeout, code))
                .map_err(|source| PipelineError::Spawn { role: Role::Consumer, source })?
        };

        let producer = {
            let queue = Arc::clone(&self.queue);
            let logger = Arc::clone(&self.logger);
            let code = self.config.producer_code;
            thread::Builder::new()
                .name("producer".into())
                .spawn(move || run_producer(&queue, &logger, items, timeout, code))
        };

        let producer = match producer {
            Ok(handle) => handle.join().map_err(|_| PipelineError::TaskPanicked(Role::Producer)),
            Err(source) => Err(PipelineError::Spawn { role: Role::Producer, source }),
        };
        if producer.is_err() {
            self.queue.mark_producer_done();
        }
        let consumer = consumer
            .join()
            .map_err(|_| PipelineError::TaskPanicked(Role::Consumer));

        let producer = producer?;
        let consumer = consumer?;

        let logs = self
            .logger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries()
            .to_vec();
        Ok(PipelineReport { producer, consumer, logs })
    }
}
