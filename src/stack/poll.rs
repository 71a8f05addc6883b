// ABOUTME: Polling schedule shared by every wait loop that observes remote state.
// ABOUTME: Fixed interval, optional overall timeout, measured on tokio's clock.

use std::time::Duration;
use tokio::time::Instant;

/// Consecutive provider errors tolerated by a poll loop before it gives up.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// How often to poll, and for how long at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    /// `None` polls until the condition holds or the run is cancelled.
    pub timeout: Option<Duration>,
}

impl PollSchedule {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub fn start(&self) -> Deadline {
        Deadline {
            started: Instant::now(),
            timeout: self.timeout,
        }
    }
}

/// Tracks elapsed time for one poll loop.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    timeout: Option<Duration>,
}

impl Deadline {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn expired(&self) -> bool {
        self.timeout.is_some_and(|t| self.elapsed() >= t)
    }
}
