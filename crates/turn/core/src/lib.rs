//! Phase-ordered, cooperative turn scheduling.
//!
//! `turn-core` runs game logic as [`Action`]s: small resumable state machines
//! that the [`TurnScheduler`] steps once per frame. A turn is split into
//! ordered [`Phase`]s, each with its own FIFO queue; the scheduler drains the
//! active phase, advances through the phase order, and ends the turn once the
//! last phase is empty. Actions may enqueue more actions (also into the
//! phase that is running), request forward phase jumps, or suspend until the
//! next tick or a span of scaled game time.
//!
//! Failures never stall a turn: an action that errors or panics is recorded
//! as a [`Diagnostic`] and treated as finished.
pub mod action;
pub mod clock;
pub mod config;
pub mod diagnostic;
pub mod env;
pub mod error;
pub mod event;
pub mod phase;
pub mod queue;
pub mod scheduler;
pub mod turn;

pub use action::{
    Action, ActionContext, ActionId, ActionInfo, BoxedAction, Delay, FnAction, PlayEffect,
    QueuedAction, Sequence, StepResult, Suspension, from_fn,
};
pub use clock::GameClock;
pub use config::SchedulerConfig;
pub use diagnostic::{Diagnostic, DiagnosticCause};
pub use env::{
    Anchor, DebugFlags, EffectHandle, EffectPlayer, EffectRequest, NullEffects, OverrideProvider,
};
pub use error::{ActionError, ClassifiedError, ConfigError, ErrorSeverity, SchedulingError};
pub use event::{ActionOutcome, TurnEvent, Wake};
pub use phase::{Phase, PhaseOrder, Side};
pub use queue::PhaseQueue;
pub use scheduler::{
    SchedulerState, SuspensionInfo, TickOutcome, TurnScheduler, TurnSchedulerBuilder,
};
pub use turn::{TurnContext, TurnSeed};
