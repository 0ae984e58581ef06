//! Frame loop metrics and statistics.
//!
//! Tracks ticks, turn throughput, and action outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use turn_core::{ActionOutcome, TurnEvent};

/// Scheduling metrics tracked by the frame worker.
///
/// Uses atomics for lock-free access from any handle clone.
#[derive(Debug, Default)]
pub struct FrameMetrics {
    /// Scheduler ticks driven while a turn was active
    ticks: AtomicU64,

    /// Turns that drained their last phase
    turns_completed: AtomicU64,

    /// Turns cancelled through the handle
    turns_cancelled: AtomicU64,

    /// Actions that reached `Done`
    actions_completed: AtomicU64,

    /// Actions that returned an error or panicked
    actions_faulted: AtomicU64,

    /// Diagnostics forwarded to the event bus
    diagnostics: AtomicU64,

    /// Stuck suspensions reported by the watchdog
    stalls: AtomicU64,
}

/// Point-in-time copy of [`FrameMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub turns_completed: u64,
    pub turns_cancelled: u64,
    pub actions_completed: u64,
    pub actions_faulted: u64,
    pub diagnostics: u64,
    pub stalls: u64,
}

impl FrameMetrics {
    /// Creates a new empty metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Updates counters from a turn event.
    pub(crate) fn record_event(&self, event: &TurnEvent) {
        match event {
            TurnEvent::TurnEnded { .. } => {
                self.turns_completed.fetch_add(1, Ordering::Relaxed);
            }
            TurnEvent::TurnCancelled { .. } => {
                self.turns_cancelled.fetch_add(1, Ordering::Relaxed);
            }
            TurnEvent::ActionFinished { outcome, .. } => {
                let counter = match outcome {
                    ActionOutcome::Completed => &self.actions_completed,
                    ActionOutcome::Faulted => &self.actions_faulted,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub(crate) fn record_diagnostic(&self) {
        self.diagnostics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stall(&self) {
        self.stalls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn turns_completed(&self) -> u64 {
        self.turns_completed.load(Ordering::Relaxed)
    }

    pub fn actions_faulted(&self) -> u64 {
        self.actions_faulted.load(Ordering::Relaxed)
    }

    /// Returns a consistent-enough copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks(),
            turns_completed: self.turns_completed(),
            turns_cancelled: self.turns_cancelled.load(Ordering::Relaxed),
            actions_completed: self.actions_completed.load(Ordering::Relaxed),
            actions_faulted: self.actions_faulted(),
            diagnostics: self.diagnostics.load(Ordering::Relaxed),
            stalls: self.stalls.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turn_core::{ActionId, ActionInfo, Phase};

    #[test]
    fn counts_turn_and_action_outcomes() {
        let metrics = FrameMetrics::new();
        let action = ActionInfo {
            id: ActionId(1),
            name: "Strike".into(),
            phase: Phase::Action,
        };

        metrics.record_event(&TurnEvent::ActionFinished {
            turn: 1,
            action: action.clone(),
            outcome: ActionOutcome::Faulted,
        });
        metrics.record_event(&TurnEvent::ActionFinished {
            turn: 1,
            action,
            outcome: ActionOutcome::Completed,
        });
        metrics.record_event(&TurnEvent::TurnEnded { turn: 1, ticks: 4 });
        metrics.record_tick();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.actions_faulted, 1);
        assert_eq!(snapshot.actions_completed, 1);
        assert_eq!(snapshot.turns_completed, 1);
        assert_eq!(snapshot.ticks, 1);
    }
}
