use serde::{Serialize, Deserialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOp {
    Insert,
    Remove,
}

/// How a single queue call ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Inserted,
    Removed,
    TimedOut,
    /// Insertion budget exhausted, item not inserted
    Rejected,
    /// Empty queue with the producer done
    Drained,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event<T> {
    pub op: EventOp,
    pub item: Option<T>,
    pub outcome: Outcome,
    pub occupancy: usize,          // queue length observed right after the call
}

impl<T> Event<T> {
    pub fn inserted(item: T, occupancy: usize) -> Self {
        Self { op: EventOp::Insert, item: Some(item), outcome: Outcome::Inserted, occupancy }
    }

    pub fn insert_timed_out(item: T, occupancy: usize) -> Self {
        Self { op: EventOp::Insert, item: Some(item), outcome: Outcome::TimedOut, occupancy }
    }

    pub fn rejected(item: T, occupancy: usize) -> Self {
        Self { op: EventOp::Insert, item: Some(item), outcome: Outcome::Rejected, occupancy }
    }

    pub fn removed(item: T, occupancy: usize) -> Self {
        Self { op: EventOp::Remove, item: Some(item), outcome: Outcome::Removed, occupancy }
    }

    pub fn remove_timed_out(occupancy: usize) -> Self {
        Self { op: EventOp::Remove, item: None, outcome: Outcome::TimedOut, occupancy }
    }

    pub fn drained() -> Self {
        Self { op: EventOp::Remove, item: None, outcome: Outcome::Drained, occupancy: 0 }
    }

    /// True when the call moved an item into or out of the queue
    pub fn is_transfer(&self) -> bool {
        matches!(self.outcome, Outcome::Inserted | Outcome::Removed)
    }
}
