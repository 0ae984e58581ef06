//! Frame worker that owns the authoritative world and the [`TurnScheduler`].
//!
//! Ticks the scheduler on a fixed frame interval, serves commands from
//! [`crate::RuntimeHandle`], and publishes turn events, diagnostics, and
//! watchdog reports to the [`EventBus`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use turn_core::{
    ActionId, BoxedAction, DebugFlags, Diagnostic, Phase, SchedulerState, Side, SuspensionInfo,
    TurnEvent, TurnScheduler, TurnSeed,
};

use super::metrics::FrameMetrics;
use super::watchdog::Watchdog;
use crate::api::{Result, RuntimeError, SeedRequest};
use crate::events::{Event, EventBus};

/// Commands that can be sent to the frame worker
pub enum Command<W> {
    /// Snapshot the world for seeding the next turn; fails while a turn runs.
    PrepareTurn {
        reply: oneshot::Sender<Result<(SeedRequest, W)>>,
    },
    /// Start a turn from a seed.
    AdvanceTurn {
        seed: TurnSeed<W>,
        reply: oneshot::Sender<Result<u64>>,
    },
    Enqueue {
        phase: Phase,
        action: BoxedAction<W>,
        reply: oneshot::Sender<Result<ActionId>>,
    },
    RequestPhaseJump {
        phase: Phase,
        reply: oneshot::Sender<Result<()>>,
    },
    CancelTurn {
        reply: oneshot::Sender<Result<u64>>,
    },
    SetPaused {
        paused: bool,
        reply: oneshot::Sender<()>,
    },
    SetSpeed {
        speed: f64,
        reply: oneshot::Sender<Result<()>>,
    },
    SetOverrides {
        flags: DebugFlags,
        reply: oneshot::Sender<()>,
    },
    /// Query scheduler state (read-only).
    QueryStatus {
        reply: oneshot::Sender<RuntimeStatus>,
    },
    /// Query a clone of the world (read-only).
    QueryWorld { reply: oneshot::Sender<W> },
    /// Query the diagnostics retained by the scheduler.
    QueryDiagnostics {
        reply: oneshot::Sender<Vec<Diagnostic>>,
    },
    /// Stop the frame loop.
    Shutdown,
}

/// Snapshot of the scheduler as seen by the frame worker.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeStatus {
    pub state: SchedulerState,
    pub turn: Option<u64>,
    pub side: Option<Side>,
    pub turns_started: u64,
    pub suspension: Option<SuspensionInfo>,
    /// Pending actions across all phases of the active turn.
    pub pending: usize,
    pub game_time: Duration,
    pub ticks: u64,
    pub paused: bool,
    pub speed: f64,
}

/// Background task that drives the scheduler.
pub struct FrameWorker<W> {
    scheduler: TurnScheduler<W>,
    world: W,
    frame_interval: Duration,
    command_rx: mpsc::Receiver<Command<W>>,
    event_bus: EventBus,
    metrics: Arc<FrameMetrics>,
    watchdog: Watchdog,
    last_side: Option<Side>,
    published_diagnostic: u64,
}

impl<W> FrameWorker<W>
where
    W: Clone + Send + 'static,
{
    pub fn new(
        scheduler: TurnScheduler<W>,
        world: W,
        frame_interval: Duration,
        watchdog_threshold: Option<Duration>,
        command_rx: mpsc::Receiver<Command<W>>,
        event_bus: EventBus,
        metrics: Arc<FrameMetrics>,
    ) -> Self {
        info!(
            target: "runtime::worker",
            frame_interval = ?frame_interval,
            watchdog_threshold = ?watchdog_threshold,
            phases = ?scheduler.phases().as_slice(),
            "FrameWorker initialized"
        );

        Self {
            scheduler,
            world,
            frame_interval,
            command_rx,
            event_bus,
            metrics,
            watchdog: Watchdog::new(watchdog_threshold),
            last_side: None,
            published_diagnostic: 0,
        }
    }

    /// Main worker loop.
    ///
    /// Uses a fixed timestep: every frame advances the scheduler by exactly
    /// `frame_interval`, regardless of wall-clock jitter.
    pub async fn run(mut self) {
        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                _ = frames.tick() => self.frame(),
            }
        }

        debug!(target: "runtime::worker", "FrameWorker stopped");
    }

    fn frame(&mut self) {
        if !self.scheduler.is_turn_active() {
            return;
        }

        self.scheduler.tick(&mut self.world, self.frame_interval);
        self.metrics.record_tick();
        self.flush();

        let turn = self.scheduler.current_turn_number();
        let suspension = self.scheduler.suspension();
        if let Some(report) = self
            .watchdog
            .observe(turn, suspension.as_ref(), Instant::now())
        {
            warn!(
                target: "runtime::watchdog",
                turn = ?report.turn,
                action = %report.action,
                stalled_for = ?report.stalled_for,
                "action suspended past watchdog threshold"
            );
            self.metrics.record_stall();
            self.event_bus.publish(Event::Watchdog(report));
        }
    }

    fn handle_command(&mut self, command: Command<W>) {
        match command {
            Command::PrepareTurn { reply } => {
                let result = self.prepare_turn();
                if reply.send(result).is_err() {
                    debug!("PrepareTurn reply channel closed (caller dropped)");
                }
            }
            Command::AdvanceTurn { seed, reply } => {
                let side = seed.side();
                let result = self.scheduler.advance_turn(seed).map_err(RuntimeError::from);
                if result.is_ok() {
                    self.last_side = Some(side);
                }
                if reply.send(result).is_err() {
                    debug!("AdvanceTurn reply channel closed (caller dropped)");
                }
            }
            Command::Enqueue {
                phase,
                action,
                reply,
            } => {
                let result = self
                    .scheduler
                    .enqueue_boxed(phase, action)
                    .map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!("Enqueue reply channel closed (caller dropped)");
                }
            }
            Command::RequestPhaseJump { phase, reply } => {
                let result = self
                    .scheduler
                    .request_phase_jump(phase)
                    .map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!("RequestPhaseJump reply channel closed (caller dropped)");
                }
            }
            Command::CancelTurn { reply } => {
                let result = self.scheduler.cancel_turn().map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!("CancelTurn reply channel closed (caller dropped)");
                }
            }
            Command::SetPaused { paused, reply } => {
                self.scheduler.set_paused(paused);
                if reply.send(()).is_err() {
                    debug!("SetPaused reply channel closed (caller dropped)");
                }
            }
            Command::SetSpeed { speed, reply } => {
                let result = self.scheduler.set_speed(speed).map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!("SetSpeed reply channel closed (caller dropped)");
                }
            }
            Command::SetOverrides { flags, reply } => {
                info!(target: "runtime::worker", ?flags, "override flags updated");
                self.scheduler.set_overrides(flags);
                if reply.send(()).is_err() {
                    debug!("SetOverrides reply channel closed (caller dropped)");
                }
            }
            Command::QueryStatus { reply } => {
                if reply.send(self.status()).is_err() {
                    debug!("QueryStatus reply channel closed (caller dropped)");
                }
            }
            Command::QueryWorld { reply } => {
                if reply.send(self.world.clone()).is_err() {
                    debug!("QueryWorld reply channel closed (caller dropped)");
                }
            }
            Command::QueryDiagnostics { reply } => {
                let diagnostics = self.scheduler.diagnostics().cloned().collect();
                if reply.send(diagnostics).is_err() {
                    debug!("QueryDiagnostics reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown => {}
        }

        self.flush();
    }

    fn prepare_turn(&self) -> Result<(SeedRequest, W)> {
        if let Some(turn) = self.scheduler.current_turn_number() {
            return Err(RuntimeError::TurnInProgress { turn });
        }
        let request = SeedRequest {
            turn: self.scheduler.turns_started() + 1,
            previous: self.last_side,
        };
        Ok((request, self.world.clone()))
    }

    fn status(&self) -> RuntimeStatus {
        let clock = self.scheduler.clock();
        RuntimeStatus {
            state: self.scheduler.state(),
            turn: self.scheduler.current_turn_number(),
            side: self.scheduler.turn().map(|turn| turn.side()),
            turns_started: self.scheduler.turns_started(),
            suspension: self.scheduler.suspension(),
            pending: self
                .scheduler
                .turn()
                .map_or(0, |turn| turn.pending_total()),
            game_time: clock.now(),
            ticks: clock.ticks(),
            paused: clock.is_paused(),
            speed: clock.speed(),
        }
    }

    /// Forwards new turn events and diagnostics to the event bus.
    fn flush(&mut self) {
        for event in self.scheduler.drain_events() {
            self.metrics.record_event(&event);
            if let TurnEvent::TurnEnded { turn, ticks } = &event {
                debug!(target: "runtime::worker", turn, ticks, "turn completed");
            }
            self.event_bus.publish(Event::Turn(event));
        }

        let fresh: Vec<Diagnostic> = self
            .scheduler
            .diagnostics()
            .filter(|diagnostic| diagnostic.seq > self.published_diagnostic)
            .cloned()
            .collect();
        for diagnostic in fresh {
            self.published_diagnostic = diagnostic.seq;
            self.metrics.record_diagnostic();
            self.event_bus.publish(Event::Diagnostic(diagnostic));
        }
    }
}
