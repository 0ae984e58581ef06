//! Structured diagnostic records and the scheduler's journal.
//!
//! Every failure the scheduler absorbs (rejected API calls, discarded
//! actions, faulting actions) produces exactly one [`Diagnostic`] and one log
//! line. Diagnostics are kept in a bounded ring; the oldest are evicted first.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{error, warn};

use crate::action::{ActionId, ActionInfo};
use crate::error::{ClassifiedError, ErrorSeverity, SchedulingError};
use crate::event::TurnEvent;
use crate::phase::Phase;

/// Why a diagnostic was recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "cause", rename_all = "snake_case"))]
pub enum DiagnosticCause {
    /// An action's step returned an error.
    ActionFailed { message: String },

    /// An action's step panicked.
    ActionPanicked { message: String },

    /// A scheduler call was rejected.
    Rejected { error: SchedulingError },

    /// A queued action was dropped because a phase jump skipped its phase.
    DiscardedByPhaseJump { from: Phase, to: Phase },
}

impl DiagnosticCause {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActionFailed { .. } | Self::ActionPanicked { .. } => ErrorSeverity::Internal,
            Self::Rejected { error } => error.severity(),
            Self::DiscardedByPhaseJump { .. } => ErrorSeverity::Recoverable,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::ActionFailed { .. } => "action_failed",
            Self::ActionPanicked { .. } => "action_panicked",
            Self::Rejected { error } => error.error_code(),
            Self::DiscardedByPhaseJump { .. } => "discarded_by_phase_jump",
        }
    }
}

impl std::fmt::Display for DiagnosticCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActionFailed { message } => write!(f, "action failed: {message}"),
            Self::ActionPanicked { message } => write!(f, "action panicked: {message}"),
            Self::Rejected { error } => write!(f, "rejected: {error}"),
            Self::DiscardedByPhaseJump { from, to } => {
                write!(f, "discarded by phase jump from {from} to {to}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Sequence number, unique per scheduler.
    pub seq: u64,
    /// Turn active when the diagnostic was recorded.
    pub turn: Option<u64>,
    /// Phase active when the diagnostic was recorded.
    pub phase: Option<Phase>,
    /// Action the diagnostic is about, if any.
    pub action: Option<ActionInfo>,
    pub cause: DiagnosticCause,
    /// Game time at which the diagnostic was recorded.
    pub at: Duration,
}

impl Diagnostic {
    pub fn severity(&self) -> ErrorSeverity {
        self.cause.severity()
    }
}

/// Where in the schedule something happened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Site {
    pub turn: Option<u64>,
    pub phase: Option<Phase>,
    pub at: Duration,
}

/// Fixed-capacity FIFO that evicts its oldest entry when full.
#[derive(Clone, Debug)]
pub(crate) struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
    evicted: u64,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            evicted: 0,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn drain(&mut self) -> Vec<T> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

/// Diagnostics, events, and identity allocation shared by the scheduler and
/// the contexts it lends to running actions.
#[derive(Debug)]
pub(crate) struct Journal {
    diagnostics: BoundedLog<Diagnostic>,
    events: BoundedLog<TurnEvent>,
    next_diagnostic: u64,
    next_action: u64,
}

impl Journal {
    pub fn new(diagnostic_capacity: usize, event_capacity: usize) -> Self {
        Self {
            diagnostics: BoundedLog::new(diagnostic_capacity),
            events: BoundedLog::new(event_capacity),
            next_diagnostic: 0,
            next_action: 0,
        }
    }

    pub fn allocate_id(&mut self) -> ActionId {
        self.next_action += 1;
        ActionId(self.next_action)
    }

    pub fn emit(&mut self, event: TurnEvent) {
        self.events.push(event);
    }

    /// Records a diagnostic and logs it at a level matching its severity.
    pub fn record(&mut self, site: Site, action: Option<ActionInfo>, cause: DiagnosticCause) {
        self.next_diagnostic += 1;
        let diagnostic = Diagnostic {
            seq: self.next_diagnostic,
            turn: site.turn,
            phase: site.phase,
            action,
            cause,
            at: site.at,
        };

        let action_label = diagnostic
            .action
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        if diagnostic.severity().is_internal() {
            error!(
                target: "turn_core::diagnostics",
                turn = ?diagnostic.turn,
                phase = ?diagnostic.phase,
                action = %action_label,
                code = diagnostic.cause.code(),
                "{}", diagnostic.cause
            );
        } else {
            warn!(
                target: "turn_core::diagnostics",
                turn = ?diagnostic.turn,
                phase = ?diagnostic.phase,
                action = %action_label,
                code = diagnostic.cause.code(),
                "{}", diagnostic.cause
            );
        }

        self.diagnostics.push(diagnostic);
    }

    pub fn reject(
        &mut self,
        site: Site,
        action: Option<ActionInfo>,
        error: SchedulingError,
    ) -> SchedulingError {
        self.record(
            site,
            action,
            DiagnosticCause::Rejected {
                error: error.clone(),
            },
        );
        error
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn evicted_diagnostics(&self) -> u64 {
        self.diagnostics.evicted()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    pub fn drain_events(&mut self) -> Vec<TurnEvent> {
        self.events.drain()
    }

    pub fn evicted_events(&self) -> u64 {
        self.events.evicted()
    }
}
