//! Capability surface lent to a running action step.

use std::time::Duration;

use super::{Action, ActionId, ActionInfo, BoxedAction};
use crate::clock::GameClock;
use crate::diagnostic::Journal;
use crate::env::{EffectPlayer, OverrideProvider};
use crate::error::SchedulingError;
use crate::phase::{Phase, Side};
use crate::scheduler::mutation;
use crate::turn::TurnContext;

/// Everything a step may read or change.
///
/// The context only lives for the duration of one [`Action::step`] call.
/// Schedule mutations made through it are validated exactly like the
/// scheduler's own API: enqueueing into a phase that already ran is rejected
/// with [`SchedulingError::PhaseAlreadyPassed`], the action is dropped and a
/// diagnostic is recorded.
pub struct ActionContext<'a, W> {
    world: &'a mut W,
    turn: &'a mut TurnContext<W>,
    journal: &'a mut Journal,
    clock: &'a GameClock,
    effects: &'a mut dyn EffectPlayer,
    overrides: &'a dyn OverrideProvider,
    action: &'a ActionInfo,
}

impl<'a, W> ActionContext<'a, W> {
    pub(crate) fn new(
        world: &'a mut W,
        turn: &'a mut TurnContext<W>,
        journal: &'a mut Journal,
        clock: &'a GameClock,
        effects: &'a mut dyn EffectPlayer,
        overrides: &'a dyn OverrideProvider,
        action: &'a ActionInfo,
    ) -> Self {
        Self {
            world,
            turn,
            journal,
            clock,
            effects,
            overrides,
            action,
        }
    }

    pub fn world(&self) -> &W {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        self.world
    }

    /// Read access to the running turn (queues, side, active phase).
    pub fn turn(&self) -> &TurnContext<W> {
        self.turn
    }

    /// Identity of the action currently stepping.
    pub fn action(&self) -> &ActionInfo {
        self.action
    }

    pub fn turn_number(&self) -> u64 {
        self.turn.number()
    }

    pub fn side(&self) -> Side {
        self.turn.side()
    }

    /// The phase currently being drained.
    pub fn phase(&self) -> Phase {
        self.turn.active_phase()
    }

    pub fn clock(&self) -> &GameClock {
        self.clock
    }

    /// Current (scaled) game time.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn effects(&self) -> &dyn EffectPlayer {
        self.effects
    }

    pub fn effects_mut(&mut self) -> &mut dyn EffectPlayer {
        self.effects
    }

    pub fn overrides(&self) -> &dyn OverrideProvider {
        self.overrides
    }

    /// Appends `action` to the tail of `phase`'s queue.
    ///
    /// Enqueueing into the active phase extends it: the new action runs
    /// before the phase advances.
    pub fn enqueue(
        &mut self,
        phase: Phase,
        action: impl Action<W> + 'static,
    ) -> Result<ActionId, SchedulingError> {
        self.enqueue_boxed(phase, Box::new(action))
    }

    pub fn enqueue_boxed(
        &mut self,
        phase: Phase,
        action: BoxedAction<W>,
    ) -> Result<ActionId, SchedulingError> {
        mutation::enqueue(self.turn, self.journal, self.clock.now(), phase, action)
    }

    /// Asks the scheduler to jump forward to `target` once this step returns.
    ///
    /// Actions still queued in the phases being skipped are discarded. A
    /// later request within the same step replaces an earlier one.
    pub fn request_phase_jump(&mut self, target: Phase) -> Result<(), SchedulingError> {
        mutation::validate_jump(self.turn, self.journal, self.clock.now(), target)?;
        if let Some(previous) = self.turn.pending_jump() {
            tracing::debug!(
                target: "turn_core::scheduler",
                turn = self.turn.number(),
                previous = %previous,
                requested = %target,
                "replacing pending phase jump"
            );
        }
        self.turn.set_jump_request(target);
        Ok(())
    }
}
