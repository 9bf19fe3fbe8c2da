//! Options and outcome for polling a model until it is awake.

use std::num::NonZeroUsize;
use std::time::Duration;

/// Default delay between two awake checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    /// Stop after this many awake checks. Polls forever when `None`.
    pub max_polls: Option<NonZeroUsize>,
}

impl WaitOptions {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            max_polls: None,
        }
    }

    pub fn with_max_polls(mut self, max_polls: Option<NonZeroUsize>) -> Self {
        self.max_polls = max_polls;
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

/// How a wait ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The model reported `"running"`.
    Awake,
    /// The cancellation token fired first.
    Cancelled,
    /// `max_polls` checks all found the model asleep.
    GaveUp,
}
