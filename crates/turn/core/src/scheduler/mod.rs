//! The turn scheduler state machine.
//!
//! [`TurnScheduler`] is a passive, single-threaded stepper: it does nothing
//! until the driver calls [`TurnScheduler::advance_turn`] and then
//! [`TurnScheduler::tick`] once per frame. Each tick resumes the suspended
//! action, or drains the active phase's queue, or advances to the next phase,
//! or ends the turn.
//!
//! Everything the scheduler absorbs (faulting actions, rejected calls,
//! discarded actions) is recorded as a [`crate::Diagnostic`]; progress is
//! reported as [`TurnEvent`]s.

pub(crate) mod mutation;

use std::any::Any;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::action::{
    Action, ActionContext, ActionId, ActionInfo, BoxedAction, QueuedAction, Suspension,
};
use crate::clock::GameClock;
use crate::config::SchedulerConfig;
use crate::diagnostic::{Diagnostic, DiagnosticCause, Journal, Site};
use crate::env::{DebugFlags, EffectPlayer, NullEffects, OverrideProvider};
use crate::error::{ConfigError, SchedulingError};
use crate::event::{ActionOutcome, TurnEvent, Wake};
use crate::phase::{Phase, PhaseOrder};
use crate::turn::{TurnContext, TurnSeed};

/// Observable scheduler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", content = "phase", rename_all = "snake_case"))]
pub enum SchedulerState {
    /// No turn is active.
    Idle,
    /// A turn is active and draining the given phase.
    Running(Phase),
}

/// What a single [`TurnScheduler::tick`] call achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No turn was active; nothing changed.
    Idle,
    /// The suspended action's wake condition is not met yet.
    Waiting,
    /// An action suspended during this tick.
    Suspended,
    /// The per-tick step budget ran out with runnable actions left.
    BudgetExhausted,
    /// The last phase drained and the turn ended.
    TurnEnded { turn: u64 },
}

/// The action currently parked in the suspended slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuspensionInfo {
    pub action: ActionInfo,
    pub wake: Wake,
    /// Tick on which the action suspended.
    pub since_tick: u64,
    /// Game time at which the action suspended.
    pub since: Duration,
}

struct Suspended<W> {
    queued: QueuedAction<W>,
    wake: Wake,
    since_tick: u64,
    since: Duration,
}

enum StepDisposition {
    Suspend(Wake),
    Finish(ActionOutcome),
}

/// Phase-ordered, cooperative action scheduler over a world of type `W`.
///
/// The world is not owned by the scheduler; the driver lends it to every
/// [`TurnScheduler::tick`] call and running actions receive it through their
/// [`ActionContext`].
pub struct TurnScheduler<W> {
    config: SchedulerConfig,
    phases: PhaseOrder,
    clock: GameClock,
    effects: Box<dyn EffectPlayer>,
    overrides: Box<dyn OverrideProvider>,
    turn: Option<TurnContext<W>>,
    suspended: Option<Suspended<W>>,
    journal: Journal,
    turns_started: u64,
}

impl<W> TurnScheduler<W> {
    pub fn builder() -> TurnSchedulerBuilder<W> {
        TurnSchedulerBuilder::new()
    }

    /// Scheduler with headless effects and all overrides off.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        Self::builder().config(config).build()
    }

    fn from_parts(
        config: SchedulerConfig,
        effects: Box<dyn EffectPlayer>,
        overrides: Box<dyn OverrideProvider>,
    ) -> Result<Self, ConfigError> {
        let phases = config.validate()?;
        let clock = GameClock::with_speed(config.speed)?;
        let journal = Journal::new(config.diagnostic_capacity, config.event_capacity);

        debug!(
            target: "turn_core::scheduler",
            phases = ?phases.as_slice(),
            max_steps_per_tick = config.max_steps_per_tick,
            catch_panics = config.catch_panics,
            "scheduler created"
        );

        Ok(Self {
            config,
            phases,
            clock,
            effects,
            overrides,
            turn: None,
            suspended: None,
            journal,
            turns_started: 0,
        })
    }

    // ========================================================================
    // Turn lifecycle
    // ========================================================================

    /// Starts a new turn seeded with `seed`'s actions.
    ///
    /// Only legal while idle. The turn starts in the first configured phase;
    /// nothing runs until the next [`TurnScheduler::tick`].
    pub fn advance_turn(&mut self, seed: TurnSeed<W>) -> Result<u64, SchedulingError> {
        if let Some(turn) = &self.turn {
            let site = mutation::site(turn, self.clock.now());
            let active = turn.number();
            return Err(self.journal.reject(
                site,
                None,
                SchedulingError::TurnAlreadyActive { turn: active },
            ));
        }
        if let Some(phase) = seed.first_unknown_phase(&self.phases) {
            let site = self.idle_site();
            return Err(self
                .journal
                .reject(site, None, SchedulingError::UnknownPhase { phase }));
        }

        self.turns_started += 1;
        let number = self.turns_started;
        let side = seed.side();
        let mut turn = TurnContext::new(
            number,
            side,
            self.phases.clone(),
            self.clock.now(),
            self.clock.ticks(),
        );

        let mut seeded = 0usize;
        for (phase, action) in seed.into_entries() {
            let info = ActionInfo {
                id: self.journal.allocate_id(),
                name: action.name().to_string(),
                phase,
            };
            if let Some(queue) = turn.queue_mut(phase) {
                queue.enqueue(QueuedAction { info, action });
                seeded += 1;
            }
        }

        let phase = turn.active_phase();
        info!(
            target: "turn_core::scheduler",
            turn = number,
            side = %side,
            phase = %phase,
            seeded,
            "turn started"
        );
        self.journal.emit(TurnEvent::TurnStarted {
            turn: number,
            side,
            phase,
        });
        self.journal.emit(TurnEvent::PhaseEntered {
            turn: number,
            phase,
        });

        self.turn = Some(turn);
        Ok(number)
    }

    /// Drives the active turn by one tick.
    ///
    /// Advances the game clock by `delta` (scaled by the clock speed), then
    /// keeps resuming or starting actions until one suspends, the step budget
    /// runs out, or the turn ends. Calling this while idle changes nothing.
    pub fn tick(&mut self, world: &mut W, delta: Duration) -> TickOutcome {
        if self.turn.is_none() {
            return TickOutcome::Idle;
        }

        self.clock.advance(delta);
        self.effects.advance_frame();
        let budget = self.config.max_steps_per_tick;
        let mut steps = 0usize;

        loop {
            if let Some(suspended) = self.suspended.take() {
                if !self.is_ready(&suspended) {
                    self.suspended = Some(suspended);
                    return TickOutcome::Waiting;
                }
                if steps >= budget {
                    self.suspended = Some(suspended);
                    return self.budget_exhausted(steps);
                }
                steps += 1;

                trace!(
                    target: "turn_core::scheduler",
                    action = %suspended.queued.info,
                    waited_ticks = self.clock.ticks() - suspended.since_tick,
                    "resuming"
                );
                self.step_action(world, suspended.queued);
                if self.suspended.is_some() {
                    return TickOutcome::Suspended;
                }
                continue;
            }

            let Some(turn) = self.turn.as_mut() else {
                return TickOutcome::Idle;
            };

            if !turn.active_queue_mut().is_empty() {
                if steps >= budget {
                    return self.budget_exhausted(steps);
                }
                let Some(queued) = turn.active_queue_mut().dequeue() else {
                    continue;
                };
                steps += 1;

                debug!(
                    target: "turn_core::scheduler",
                    turn = turn.number(),
                    action = %queued.info,
                    "action started"
                );
                self.journal.emit(TurnEvent::ActionStarted {
                    turn: turn.number(),
                    action: queued.info.clone(),
                });
                self.step_action(world, queued);
                if self.suspended.is_some() {
                    return TickOutcome::Suspended;
                }
                continue;
            }

            if turn.advance_phase() {
                let phase = turn.active_phase();
                debug!(
                    target: "turn_core::scheduler",
                    turn = turn.number(),
                    phase = %phase,
                    "phase entered"
                );
                self.journal.emit(TurnEvent::PhaseEntered {
                    turn: turn.number(),
                    phase,
                });
                continue;
            }

            return self.end_turn();
        }
    }

    /// Forces the scheduler back to idle, abandoning the active turn.
    ///
    /// A suspended action is dropped without being resumed again; whatever
    /// it committed before its last suspension stays committed.
    pub fn cancel_turn(&mut self) -> Result<u64, SchedulingError> {
        let site = self.idle_site();
        let Some(turn) = self.turn.take() else {
            return Err(self
                .journal
                .reject(site, None, SchedulingError::NoActiveTurn));
        };

        let suspended = self.suspended.take();
        let abandoned = turn.pending_total() + usize::from(suspended.is_some());
        let number = turn.number();

        warn!(
            target: "turn_core::scheduler",
            turn = number,
            phase = %turn.active_phase(),
            abandoned,
            suspended = ?suspended.as_ref().map(|s| s.queued.info.to_string()),
            "turn cancelled"
        );
        self.journal.emit(TurnEvent::TurnCancelled {
            turn: number,
            abandoned,
        });
        Ok(number)
    }

    // ========================================================================
    // Queue mutation from the driver
    // ========================================================================

    /// Appends `action` to `phase`'s queue of the active turn.
    ///
    /// Fails with [`SchedulingError::NoActiveTurn`] while idle and with
    /// [`SchedulingError::PhaseAlreadyPassed`] when `phase` already ran. In
    /// both cases the action is dropped and a diagnostic is recorded.
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
        let now = self.clock.now();
        if self.turn.is_none() {
            let info = ActionInfo {
                id: self.journal.allocate_id(),
                name: action.name().to_string(),
                phase,
            };
            let site = self.idle_site();
            return Err(self
                .journal
                .reject(site, Some(info), SchedulingError::NoActiveTurn));
        }

        match self.turn.as_mut() {
            Some(turn) => mutation::enqueue(turn, &mut self.journal, now, phase, action),
            None => Err(SchedulingError::NoActiveTurn),
        }
    }

    /// Jumps the active turn forward to `target` immediately.
    ///
    /// Actions queued in the skipped phases are discarded. A suspended action
    /// keeps its slot and resumes in the new phase.
    pub fn request_phase_jump(&mut self, target: Phase) -> Result<(), SchedulingError> {
        let now = self.clock.now();
        let site = self.idle_site();
        let Some(turn) = self.turn.as_mut() else {
            return Err(self
                .journal
                .reject(site, None, SchedulingError::NoActiveTurn));
        };

        mutation::validate_jump(turn, &mut self.journal, now, target)?;
        mutation::apply_jump(turn, &mut self.journal, now, target);
        Ok(())
    }

    // ========================================================================
    // Clock and environment
    // ========================================================================

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Holds every time-based suspension while paused.
    pub fn set_paused(&mut self, paused: bool) {
        if self.clock.is_paused() != paused {
            info!(target: "turn_core::scheduler", paused, "clock pause toggled");
        }
        self.clock.set_paused(paused);
    }

    /// Sets the game-time scale. Zero holds time like a pause.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        self.clock.set_speed(speed)?;
        info!(target: "turn_core::scheduler", speed, "clock speed changed");
        Ok(())
    }

    pub fn effects(&self) -> &dyn EffectPlayer {
        self.effects.as_ref()
    }

    pub fn effects_mut(&mut self) -> &mut dyn EffectPlayer {
        self.effects.as_mut()
    }

    pub fn set_effects(&mut self, effects: impl EffectPlayer + 'static) {
        self.effects = Box::new(effects);
    }

    pub fn overrides(&self) -> &dyn OverrideProvider {
        self.overrides.as_ref()
    }

    pub fn set_overrides(&mut self, overrides: impl OverrideProvider + 'static) {
        self.overrides = Box::new(overrides);
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn phases(&self) -> &PhaseOrder {
        &self.phases
    }

    pub fn state(&self) -> SchedulerState {
        match &self.turn {
            Some(turn) => SchedulerState::Running(turn.active_phase()),
            None => SchedulerState::Idle,
        }
    }

    pub fn is_turn_active(&self) -> bool {
        self.turn.is_some()
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.turn.as_ref().map(TurnContext::active_phase)
    }

    pub fn current_turn_number(&self) -> Option<u64> {
        self.turn.as_ref().map(TurnContext::number)
    }

    /// Number of turns started so far, including the active one.
    pub fn turns_started(&self) -> u64 {
        self.turns_started
    }

    pub fn turn(&self) -> Option<&TurnContext<W>> {
        self.turn.as_ref()
    }

    pub fn suspension(&self) -> Option<SuspensionInfo> {
        self.suspended.as_ref().map(|suspended| SuspensionInfo {
            action: suspended.queued.info.clone(),
            wake: suspended.wake,
            since_tick: suspended.since_tick,
            since: suspended.since,
        })
    }

    /// Retained diagnostics, oldest first.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.journal.diagnostics()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.journal.diagnostic_count()
    }

    /// Diagnostics dropped because the ring was full.
    pub fn evicted_diagnostics(&self) -> u64 {
        self.journal.evicted_diagnostics()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.journal.take_diagnostics()
    }

    /// Removes and returns every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<TurnEvent> {
        self.journal.drain_events()
    }

    /// Events dropped because the outbox was full before being drained.
    pub fn evicted_events(&self) -> u64 {
        self.journal.evicted_events()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn idle_site(&self) -> Site {
        Site {
            turn: None,
            phase: None,
            at: self.clock.now(),
        }
    }

    fn is_ready(&self, suspended: &Suspended<W>) -> bool {
        let ticks = self.clock.ticks();
        if ticks <= suspended.since_tick {
            return false;
        }
        match suspended.wake {
            Wake::AfterTick(tick) => ticks > tick,
            Wake::At(deadline) => self.clock.now() >= deadline,
        }
    }

    fn budget_exhausted(&self, steps: usize) -> TickOutcome {
        warn!(
            target: "turn_core::scheduler",
            turn = ?self.current_turn_number(),
            phase = ?self.current_phase(),
            steps,
            "step budget exhausted; continuing next tick"
        );
        TickOutcome::BudgetExhausted
    }

    /// Runs one step of `queued` and files the result.
    ///
    /// A suspending action is parked in the suspended slot; a finishing or
    /// faulting one is dropped. A phase jump requested during the step is
    /// applied afterwards.
    fn step_action(&mut self, world: &mut W, mut queued: QueuedAction<W>) {
        let Some(turn) = self.turn.as_mut() else {
            return;
        };
        turn.set_current(Some(queued.info.clone()));

        let catch_panics = self.config.catch_panics;
        let result = {
            let mut ctx = ActionContext::new(
                world,
                turn,
                &mut self.journal,
                &self.clock,
                self.effects.as_mut(),
                self.overrides.as_ref(),
                &queued.info,
            );
            let action = &mut queued.action;
            if catch_panics {
                panic::catch_unwind(AssertUnwindSafe(|| action.step(&mut ctx)))
            } else {
                Ok(action.step(&mut ctx))
            }
        };

        let now = self.clock.now();
        let number = turn.number();
        let disposition = match result {
            Ok(Ok(Suspension::Done)) => StepDisposition::Finish(ActionOutcome::Completed),
            Ok(Ok(Suspension::Continue)) => {
                StepDisposition::Suspend(Wake::AfterTick(self.clock.ticks()))
            }
            Ok(Ok(Suspension::ContinueAfter(delay))) => {
                StepDisposition::Suspend(Wake::At(now.saturating_add(delay)))
            }
            Ok(Err(error)) => {
                self.journal.record(
                    mutation::site(turn, now),
                    Some(queued.info.clone()),
                    DiagnosticCause::ActionFailed {
                        message: error.report(),
                    },
                );
                StepDisposition::Finish(ActionOutcome::Faulted)
            }
            Err(payload) => {
                self.journal.record(
                    mutation::site(turn, now),
                    Some(queued.info.clone()),
                    DiagnosticCause::ActionPanicked {
                        message: panic_message(&*payload),
                    },
                );
                StepDisposition::Finish(ActionOutcome::Faulted)
            }
        };

        match disposition {
            StepDisposition::Suspend(wake) => {
                trace!(
                    target: "turn_core::scheduler",
                    turn = number,
                    action = %queued.info,
                    wake = ?wake,
                    "action suspended"
                );
                self.journal.emit(TurnEvent::ActionSuspended {
                    turn: number,
                    action: queued.info.clone(),
                    wake,
                });
                self.suspended = Some(Suspended {
                    queued,
                    wake,
                    since_tick: self.clock.ticks(),
                    since: now,
                });
            }
            StepDisposition::Finish(outcome) => {
                turn.set_current(None);
                debug!(
                    target: "turn_core::scheduler",
                    turn = number,
                    action = %queued.info,
                    outcome = %outcome,
                    "action finished"
                );
                self.journal.emit(TurnEvent::ActionFinished {
                    turn: number,
                    action: queued.info,
                    outcome,
                });
            }
        }

        if let Some(target) = turn.take_jump_request() {
            mutation::apply_jump(turn, &mut self.journal, now, target);
        }
    }

    fn end_turn(&mut self) -> TickOutcome {
        let Some(turn) = self.turn.take() else {
            return TickOutcome::Idle;
        };
        let number = turn.number();
        let ticks = self.clock.ticks().saturating_sub(turn.started_tick());

        info!(
            target: "turn_core::scheduler",
            turn = number,
            side = %turn.side(),
            ticks,
            elapsed = ?self.clock.now().saturating_sub(turn.started_at()),
            "turn ended"
        );
        self.journal.emit(TurnEvent::TurnEnded {
            turn: number,
            ticks,
        });
        TickOutcome::TurnEnded { turn: number }
    }
}

impl<W> std::fmt::Debug for TurnScheduler<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnScheduler")
            .field("state", &self.state())
            .field("clock", &self.clock)
            .field("turn", &self.turn)
            .field("suspension", &self.suspension())
            .field("turns_started", &self.turns_started)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Builder for [`TurnScheduler`].
///
/// Defaults to [`SchedulerConfig::default`], [`NullEffects`], and all
/// overrides off.
pub struct TurnSchedulerBuilder<W> {
    config: SchedulerConfig,
    effects: Option<Box<dyn EffectPlayer>>,
    overrides: Option<Box<dyn OverrideProvider>>,
    _world: PhantomData<fn() -> W>,
}

impl<W> TurnSchedulerBuilder<W> {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            effects: None,
            overrides: None,
            _world: PhantomData,
        }
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn effects(mut self, effects: impl EffectPlayer + 'static) -> Self {
        self.effects = Some(Box::new(effects));
        self
    }

    pub fn overrides(mut self, overrides: impl OverrideProvider + 'static) -> Self {
        self.overrides = Some(Box::new(overrides));
        self
    }

    pub fn build(self) -> Result<TurnScheduler<W>, ConfigError> {
        TurnScheduler::from_parts(
            self.config,
            self.effects
                .unwrap_or_else(|| Box::new(NullEffects::default())),
            self.overrides
                .unwrap_or_else(|| Box::new(DebugFlags::default())),
        )
    }
}

impl<W> Default for TurnSchedulerBuilder<W> {
    fn default() -> Self {
        Self::new()
    }
}
