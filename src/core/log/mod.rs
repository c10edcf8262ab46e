use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use crate::core::event::{Event, EventOp, Outcome};
use serde::{Serialize, Deserialize};

/// Which side of the queue produced an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Producer,
    Consumer,
}

/// Log entry recording one queue call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry<T> {
    pub local_log_id: u64,
    pub role: Role,
    pub event: Event<T>,
}

impl<T: std::fmt::Debug> Display for LogEntry<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogEntry {{ local_log_id: {}, role: {:?}, op: {:?}, item: {:?}, outcome: {:?}, occupancy: {} }}",
            self.local_log_id,
            self.role,
            self.event.op,
            self.event.item,
            self.event.outcome,
            self.event.occupancy,
        )
    }
}

#[derive(Clone, Debug)]
/// Logger storing all entries
pub struct Logger<T> {
    pub(crate) entries: Vec<LogEntry<T>>,
    next_id: u64,
}

impl<T> Default for Logger<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Logger<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_id: 1 }
    }

    /// Log a queue call, returning its id
    pub fn log(&mut self, role: Role, event: Event<T>) -> u64 {
        // --- Negative-space assertion: role matches operation ---
        match role {
            Role::Producer => assert_eq!(event.op, EventOp::Insert, "Producer may only insert"),
            Role::Consumer => assert_eq!(event.op, EventOp::Remove, "Consumer may only remove"),
        }

        // --- Negative-space assertion: outcome must match operation ---
        match event.op {
            EventOp::Insert => assert!(
                matches!(event.outcome, Outcome::Inserted | Outcome::TimedOut | Outcome::Rejected),
                "Insert must end Inserted, TimedOut or Rejected"
            ),
            EventOp::Remove => assert!(
                matches!(event.outcome, Outcome::Removed | Outcome::TimedOut | Outcome::Drained),
                "Remove must end Removed, TimedOut or Drained"
            ),
        }

        let local_log_id = self.next_id;
        self.next_id += 1;

        let before = self.entries.len();
        self.entries.push(LogEntry { local_log_id, role, event });

        // --- Negative-space assertion: log length increased exactly by 1 ---
        assert_eq!(
            self.entries.len(),
            before + 1,
            "Logger must increase by exactly one entry"
        );
        local_log_id
    }

    pub fn entries(&self) -> &[LogEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Logger<T> {
    pub fn entries_for(&self, role: Role) -> Vec<LogEntry<T>> {
        self.entries
            .iter()
            .filter(|entry| entry.role == role)
            .cloned()
            .collect()
    }

    /// Items that actually crossed the queue on the given side, in log order
    pub fn transferred_items(&self, role: Role) -> Vec<T> {
        self.entries
            .iter()
            .filter(|entry| entry.role == role && entry.event.is_transfer())
            .filter_map(|entry| entry.event.item.clone())
            .collect()
    }

    pub fn get_entries_since(&self, log_id: u64) -> Vec<LogEntry<T>> {
        self.entries
            .iter()
            .filter(|entry| entry.local_log_id > log_id)
            .cloned()
            .collect()
    }
}

/// Append entries to `path` as NDJSON, one JSON object per line
pub fn append_logs<T: Serialize>(log: &[LogEntry<T>], path: impl AsRef<Path>) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;

    for entry in log {
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
    }
    Ok(())
}

/// Install the console subscriber; later calls are no-ops.
///
/// Honors `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

/// Thread-safe wrapper
pub type SafeLogger<T> = Arc<Mutex<Logger<T>>>;
