//! Actions: resumable units of turn logic.
//!
//! An action is a small state machine. Every time the scheduler gives it
//! control it runs one [`Action::step`] and answers with a [`Suspension`]
//! telling the scheduler when to call it again. Between two steps the action
//! holds no borrow of scheduler state; all mutation goes through the
//! [`ActionContext`] handed to `step`.
//!
//! Modules:
//! - [`context`]: the capability surface exposed to a running step
//! - [`kinds`]: reusable actions (closures, delays, effect playback)
//! - [`sequence`]: composition of several actions into one queue slot

pub mod context;
pub mod kinds;
pub mod sequence;

pub use context::ActionContext;
pub use kinds::{Delay, FnAction, PlayEffect, from_fn};
pub use sequence::Sequence;

use std::time::Duration;

use crate::error::ActionError;
use crate::phase::Phase;

/// When a suspended action wants to be resumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Suspension {
    /// Resume on the next scheduler tick.
    Continue,
    /// Resume once at least this much scaled game time has elapsed.
    ContinueAfter(Duration),
    /// Terminal: the action is finished and is dropped.
    Done,
}

impl Suspension {
    pub const fn is_done(&self) -> bool {
        matches!(self, Suspension::Done)
    }
}

/// Result of a single action step.
pub type StepResult = Result<Suspension, ActionError>;

/// Unit of turn logic executed by the scheduler.
///
/// `W` is the world state the game session passes to each tick; actions read
/// and mutate it through [`ActionContext::world`] / [`ActionContext::world_mut`].
///
/// # Failure isolation
///
/// Returning `Err` (or panicking, when the scheduler catches panics) ends the
/// action as if it returned [`Suspension::Done`]. The scheduler records a
/// diagnostic and moves on to the next queued action.
pub trait Action<W>: Send {
    /// Human-readable identity used in events and diagnostics.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let path = full.split('<').next().unwrap_or(full);
        path.rsplit("::").next().unwrap_or(path)
    }

    /// Runs the action until its next suspension point.
    fn step(&mut self, ctx: &mut ActionContext<'_, W>) -> StepResult;
}

/// Owned, type-erased action as stored in phase queues.
pub type BoxedAction<W> = Box<dyn Action<W>>;

impl<W> Action<W> for BoxedAction<W> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn step(&mut self, ctx: &mut ActionContext<'_, W>) -> StepResult {
        (**self).step(ctx)
    }
}

/// Scheduler-assigned identifier, unique per scheduler instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionId(pub u64);

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a scheduled action as it appears in events and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionInfo {
    pub id: ActionId,
    pub name: String,
    /// Phase whose queue the action was scheduled into.
    pub phase: Phase,
}

impl std::fmt::Display for ActionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{} ({})", self.name, self.id, self.phase)
    }
}

/// An action waiting in a phase queue, paired with its identity.
pub struct QueuedAction<W> {
    pub info: ActionInfo,
    pub action: BoxedAction<W>,
}

impl<W> std::fmt::Debug for QueuedAction<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedAction")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SpawnEnemies;

    impl Action<()> for SpawnEnemies {
        fn step(&mut self, _ctx: &mut ActionContext<'_, ()>) -> StepResult {
            Ok(Suspension::Done)
        }
    }

    #[test]
    fn default_name_is_short_type_name() {
        assert_eq!(Action::<()>::name(&SpawnEnemies), "SpawnEnemies");

        let boxed: BoxedAction<()> = Box::new(SpawnEnemies);
        assert_eq!(boxed.name(), "SpawnEnemies");
    }

    #[test]
    fn action_info_display() {
        let info = ActionInfo {
            id: ActionId(7),
            name: "MoveEnemy".into(),
            phase: Phase::Move,
        };
        assert_eq!(info.to_string(), "MoveEnemy#7 (move)");
    }
}
