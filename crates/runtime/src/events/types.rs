//! Event types for the runtime-only topics.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use turn_core::{ActionInfo, Wake};

/// A suspended action has held the turn longer than the watchdog threshold.
///
/// Reported once per stuck action. The scheduler keeps waiting; stuck
/// actions are an operational concern, not a scheduling failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogReport {
    pub turn: Option<u64>,
    pub action: ActionInfo,
    pub wake: Wake,
    /// Wall-clock time since the action was first seen suspended.
    pub stalled_for: Duration,
}

/// How a turn driven by [`crate::Runtime::play_turn`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "end", rename_all = "snake_case")]
pub enum TurnEnd {
    /// The last phase drained.
    Completed { ticks: u64 },
    /// The turn was cancelled through the handle.
    Cancelled { abandoned: usize },
    /// The turn finished while the subscriber lagged behind the event bus.
    Unobserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub turn: u64,
    pub side: turn_core::Side,
    pub end: TurnEnd,
}
