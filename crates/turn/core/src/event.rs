//! Events recorded by the scheduler as a turn progresses.
//!
//! The scheduler appends events to a bounded outbox; the driver drains them
//! with [`crate::TurnScheduler::drain_events`] and forwards them to UI, logs,
//! or an event bus.

use std::time::Duration;

use crate::action::ActionInfo;
use crate::phase::{Phase, Side};

/// Condition a suspended action is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Wake {
    /// Ready on any tick after the given tick number.
    AfterTick(u64),
    /// Ready once game time reaches the given instant.
    At(Duration),
}

/// How an action left the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum ActionOutcome {
    /// Reached `Done`.
    Completed,
    /// Returned an error or panicked; treated as `Done`.
    Faulted,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum TurnEvent {
    TurnStarted {
        turn: u64,
        side: Side,
        phase: Phase,
    },
    PhaseEntered {
        turn: u64,
        phase: Phase,
    },
    /// A phase was bypassed by a phase jump; `discarded` queued actions were dropped.
    PhaseSkipped {
        turn: u64,
        phase: Phase,
        discarded: usize,
    },
    ActionStarted {
        turn: u64,
        action: ActionInfo,
    },
    ActionSuspended {
        turn: u64,
        action: ActionInfo,
        wake: Wake,
    },
    ActionFinished {
        turn: u64,
        action: ActionInfo,
        outcome: ActionOutcome,
    },
    TurnEnded {
        turn: u64,
        /// Scheduler ticks spent on the turn.
        ticks: u64,
    },
    /// The driver cancelled the turn; `abandoned` actions never finished.
    TurnCancelled {
        turn: u64,
        abandoned: usize,
    },
}

impl TurnEvent {
    pub fn turn(&self) -> u64 {
        match self {
            TurnEvent::TurnStarted { turn, .. }
            | TurnEvent::PhaseEntered { turn, .. }
            | TurnEvent::PhaseSkipped { turn, .. }
            | TurnEvent::ActionStarted { turn, .. }
            | TurnEvent::ActionSuspended { turn, .. }
            | TurnEvent::ActionFinished { turn, .. }
            | TurnEvent::TurnEnded { turn, .. }
            | TurnEvent::TurnCancelled { turn, .. } => *turn,
        }
    }

    /// True for the events that close a turn.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TurnEvent::TurnEnded { .. } | TurnEvent::TurnCancelled { .. }
        )
    }
}
