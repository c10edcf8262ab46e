use std::time::{Duration, Instant};

/// Fixed point in time a timed wait must not run past
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        // Saturate instead of overflowing for absurd timeouts
        let now = Instant::now();
        let at = now.checked_add(timeout).unwrap_or_else(|| far_future(now));
        Self { at }
    }

    /// `None` for an untimed wait
    pub fn from_timeout(timeout: Option<Duration>) -> Option<Self> {
        timeout.map(Self::after)
    }

    /// Remaining wait budget, `None` once the deadline has passed
    pub fn remaining(&self) -> Option<Duration> {
        let left = self.at.saturating_duration_since(Instant::now());
        if left.is_zero() { None } else { Some(left) }
    }

    pub fn has_expired(&self) -> bool {
        self.remaining().is_none()
    }
}

fn far_future(now: Instant) -> Instant {
    // ~30 years, well beyond any wait this crate performs
    let mut span = Duration::from_secs(60 * 60 * 24 * 365 * 30);
    loop {
        if let Some(at) = now.checked_add(span) {
            return at;
        }
        span /= 2;
    }
}
