//! Admission policies and per-container scheduling knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Admission and promotion rule for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// One visible item; a new arrival replaces the current one.
    #[default]
    OneByOne,
    /// One visible item; new arrivals wait until the current one is dismissed.
    OneByOneWaitFinish,
    /// Up to `capacity` visible items; the rest wait in FIFO order.
    Multiple { capacity: usize },
}

impl Policy {
    /// Maximum number of items in the main queue.
    pub fn capacity(&self) -> usize {
        match self {
            Policy::OneByOne | Policy::OneByOneWaitFinish => 1,
            Policy::Multiple { capacity } => *capacity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::OneByOne => "one_by_one",
            Policy::OneByOneWaitFinish => "one_by_one_wait_finish",
            Policy::Multiple { .. } => "multiple",
        }
    }
}

/// Which main-queue item counts as topmost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayOrder {
    /// Newest item is drawn last, so the latest insertion is topmost.
    #[default]
    Ascending,
    /// Newest item is drawn first, so the earliest insertion is topmost.
    Descending,
}

/// Coalescing applied to a container's incoming action stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InputShaping {
    #[default]
    None,
    /// Deliver only the last action of a burst, `window_ms` after it arrived.
    Debounce { window_ms: u64 },
    /// Deliver at most one action per window, always the most recent one.
    Latest { window_ms: u64 },
}

impl InputShaping {
    pub fn window(&self) -> Option<Duration> {
        match self {
            InputShaping::None => None,
            InputShaping::Debounce { window_ms } | InputShaping::Latest { window_ms } => {
                Some(Duration::from_millis(*window_ms))
            }
        }
    }
}

/// Trace threshold for a container's lifecycle and action logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Quiet,
    #[default]
    Lifecycle,
    Actions,
}

impl Verbosity {
    pub fn logs_lifecycle(self) -> bool {
        self >= Verbosity::Lifecycle
    }

    pub fn logs_actions(self) -> bool {
        self >= Verbosity::Actions
    }
}
