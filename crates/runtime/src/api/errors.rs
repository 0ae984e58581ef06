//! Unified error types surfaced by the runtime API.
//!
//! Wraps scheduler rejections, configuration failures, and worker channel
//! failures so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use turn_core::{ClassifiedError, ConfigError, ErrorSeverity, SchedulingError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("invalid scheduler configuration")]
    Config(#[from] ConfigError),

    #[error("turn {turn} is still in progress")]
    TurnInProgress { turn: u64 },

    #[error("runtime requires a world before building")]
    MissingWorld,

    #[error("turn seeder not set")]
    SeederNotSet,

    #[error("turn seeder failed: {message}")]
    Seeder { message: String },

    #[error("frame worker command channel closed")]
    CommandChannelClosed,

    #[error("frame worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("runtime event stream closed")]
    EventStreamClosed,

    #[error("frame worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl RuntimeError {
    pub fn seeder(message: impl Into<String>) -> Self {
        Self::Seeder {
            message: message.into(),
        }
    }

    /// Severity using the same classification as the scheduler's own errors.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Scheduling(error) => error.severity(),
            Self::Config(error) => error.severity(),
            Self::TurnInProgress { .. } => ErrorSeverity::Recoverable,
            Self::MissingWorld | Self::SeederNotSet => ErrorSeverity::Validation,
            Self::Seeder { .. }
            | Self::CommandChannelClosed
            | Self::ReplyChannelClosed(_)
            | Self::EventStreamClosed
            | Self::WorkerJoin(_) => ErrorSeverity::Internal,
        }
    }
}
