//! Common error infrastructure for turn-core.
//!
//! Errors are split by who caused them:
//! - [`SchedulingError`]: a caller used the scheduler API incorrectly
//! - [`ConfigError`]: a scheduler was configured with invalid settings
//! - [`ActionError`]: an action's step failed while executing
//!
//! All of them implement [`ClassifiedError`] so diagnostics and logs can be
//! grouped by severity and a stable error code.

use crate::phase::Phase;

/// Severity level of an error, used for categorization and logging.
///
/// - **Recoverable**: the caller can retry later or with different input
/// - **Validation**: invalid input, rejected without any state change
/// - **Internal**: an action misbehaved; the turn continues without it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorSeverity {
    /// Recoverable error, e.g. starting a turn while one is still running.
    Recoverable,

    /// Validation error, e.g. enqueueing into a phase that already ran.
    Validation,

    /// Internal error, e.g. an action returned an error or panicked.
    ///
    /// These indicate bugs in game logic and should be investigated.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all turn-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait ClassifiedError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for this error variant, stable across releases.
    fn error_code(&self) -> &'static str;
}

/// Rejected use of the scheduler API.
///
/// None of these change scheduler state, apart from recording a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum SchedulingError {
    #[error("turn {turn} is already active")]
    TurnAlreadyActive { turn: u64 },

    #[error("no turn is active")]
    NoActiveTurn,

    #[error("phase {phase} is not part of the configured phase order")]
    UnknownPhase { phase: Phase },

    #[error("phase {target} already ran this turn (active phase is {active})")]
    PhaseAlreadyPassed { target: Phase, active: Phase },

    #[error("cannot jump to phase {target}: it does not come after the active phase {active}")]
    InvalidPhaseJump { target: Phase, active: Phase },
}

impl ClassifiedError for SchedulingError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TurnAlreadyActive { .. } | Self::NoActiveTurn => ErrorSeverity::Recoverable,
            Self::UnknownPhase { .. }
            | Self::PhaseAlreadyPassed { .. }
            | Self::InvalidPhaseJump { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TurnAlreadyActive { .. } => "turn_already_active",
            Self::NoActiveTurn => "no_active_turn",
            Self::UnknownPhase { .. } => "unknown_phase",
            Self::PhaseAlreadyPassed { .. } => "phase_already_passed",
            Self::InvalidPhaseJump { .. } => "invalid_phase_jump",
        }
    }
}

/// Invalid scheduler configuration.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("phase order must contain at least one phase")]
    EmptyPhaseOrder,

    #[error("phase order must be strictly ascending ({before} is followed by {after})")]
    PhaseOrderNotAscending { before: Phase, after: Phase },

    #[error("time scale must be finite and non-negative (got {0})")]
    InvalidSpeed(f64),

    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },
}

impl ClassifiedError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPhaseOrder => "empty_phase_order",
            Self::PhaseOrderNotAscending { .. } => "phase_order_not_ascending",
            Self::InvalidSpeed(_) => "invalid_speed",
            Self::ZeroLimit { .. } => "zero_limit",
        }
    }
}

/// Failure raised by an action's step.
///
/// The scheduler never propagates this error: it records a diagnostic and
/// treats the action as finished.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error with a short description of what failed.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message followed by the chain of sources, separated by `: `.
    pub fn report(&self) -> String {
        let mut report = self.message.clone();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl ClassifiedError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        "action_failed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("tile (3, 4) is blocked")]
    struct Blocked;

    #[test]
    fn action_error_report_includes_source_chain() {
        let error = ActionError::with_source("move failed", Blocked);
        assert_eq!(error.to_string(), "move failed");
        assert_eq!(error.report(), "move failed: tile (3, 4) is blocked");
    }

    #[test]
    fn scheduling_errors_are_classified() {
        let misuse = SchedulingError::TurnAlreadyActive { turn: 3 };
        assert_eq!(misuse.severity(), ErrorSeverity::Recoverable);
        assert_eq!(misuse.error_code(), "turn_already_active");

        let late = SchedulingError::PhaseAlreadyPassed {
            target: Phase::Start,
            active: Phase::Move,
        };
        assert_eq!(late.severity(), ErrorSeverity::Validation);
        assert_eq!(
            late.to_string(),
            "phase start already ran this turn (active phase is move)"
        );
    }
}
