//! High-level runtime orchestrator.
//!
//! The runtime owns the frame worker, wires up command/event channels, and
//! exposes a builder-based API for clients to play turns.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use turn_core::{EffectPlayer, OverrideProvider, SchedulerConfig, TurnEvent, TurnScheduler};

use crate::api::{Result, RuntimeError, RuntimeHandle, TurnSeeder};
use crate::events::{Event, Topic, TurnEnd, TurnSummary};
use crate::workers::{Command, FrameMetrics, FrameWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub scheduler: SchedulerConfig,
    /// Fixed timestep between scheduler ticks
    pub frame_interval: Duration,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Report suspensions held longer than this (wall clock); `None` disables
    pub watchdog_threshold: Option<Duration>,
    /// Stop [`Runtime::run`] after this many turns; `None` runs until the
    /// seeder ends the session
    pub max_turns: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            frame_interval: Duration::from_millis(16),
            command_buffer_size: 32,
            event_buffer_size: 256,
            watchdog_threshold: Some(Duration::from_secs(5)),
            max_turns: None,
        }
    }
}

/// Main runtime that orchestrates turn scheduling
///
/// Design: Runtime owns the worker and drives the seeder.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime<W>
where
    W: Clone + Send + Sync + 'static,
{
    // Shared handle (can be cloned for clients)
    handle: RuntimeHandle<W>,

    // Turn seeder (injected by user)
    seeder: Option<Box<dyn TurnSeeder<W>>>,

    config: RuntimeConfig,

    // Background worker
    frame_worker_handle: JoinHandle<()>,
}

impl<W> Runtime<W>
where
    W: Clone + Send + Sync + 'static,
{
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder<W> {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle<W> {
        self.handle.clone()
    }

    /// Subscribe to events of one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Seed, start, and await a single turn
    ///
    /// Returns `Ok(None)` when the seeder ends the session. Requires a seeder
    /// and an idle scheduler.
    pub async fn play_turn(&mut self) -> Result<Option<TurnSummary>> {
        let seeder = self.seeder.as_ref().ok_or(RuntimeError::SeederNotSet)?;

        let (request, snapshot) = self.handle.prepare_turn().await?;
        let Some(seed) = seeder.seed(request, &snapshot).await? else {
            info!(target: "runtime", turn = request.turn, "seeder ended the session");
            return Ok(None);
        };

        // Subscribe before starting so the terminal event cannot be missed.
        let mut turn_rx = self.handle.subscribe(Topic::Turn);
        let side = seed.side();
        let turn = self.handle.advance_turn(seed).await?;

        loop {
            let end = match turn_rx.recv().await {
                Ok(Event::Turn(TurnEvent::TurnEnded { turn: ended, ticks })) if ended == turn => {
                    TurnEnd::Completed { ticks }
                }
                Ok(Event::Turn(TurnEvent::TurnCancelled {
                    turn: cancelled,
                    abandoned,
                })) if cancelled == turn => TurnEnd::Cancelled { abandoned },
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "runtime", turn, skipped, "turn event subscriber lagged");
                    if self.handle.status().await?.turn == Some(turn) {
                        continue;
                    }
                    TurnEnd::Unobserved
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(RuntimeError::EventStreamClosed);
                }
            };

            return Ok(Some(TurnSummary { turn, side, end }));
        }
    }

    /// Play turns back to back until the seeder ends the session or
    /// `max_turns` is reached
    pub async fn run(&mut self) -> Result<Vec<TurnSummary>> {
        let mut summaries = Vec::new();
        while self
            .config
            .max_turns
            .is_none_or(|limit| (summaries.len() as u64) < limit)
        {
            match self.play_turn().await? {
                Some(summary) => summaries.push(summary),
                None => break,
            }
        }
        Ok(summaries)
    }

    /// Set the turn seeder
    pub fn set_seeder(&mut self, seeder: impl TurnSeeder<W> + 'static) {
        self.seeder = Some(Box::new(seeder));
    }

    pub fn metrics(&self) -> &FrameMetrics {
        self.handle.metrics()
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        // Outstanding handle clones keep the channel open, so stop explicitly.
        if self.handle.shutdown().await.is_err() {
            warn!(target: "runtime", "frame worker already stopped");
        }

        self.frame_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder<W>
where
    W: Clone + Send + Sync + 'static,
{
    config: RuntimeConfig,
    world: Option<W>,
    seeder: Option<Box<dyn TurnSeeder<W>>>,
    effects: Option<Box<dyn EffectPlayer>>,
    overrides: Option<Box<dyn OverrideProvider>>,
}

impl<W> RuntimeBuilder<W>
where
    W: Clone + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            world: None,
            seeder: None,
            effects: None,
            overrides: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide the initial world (required)
    pub fn world(mut self, world: W) -> Self {
        self.world = Some(world);
        self
    }

    /// Set turn seeder (optional; required for [`Runtime::play_turn`])
    pub fn seeder(mut self, seeder: impl TurnSeeder<W> + 'static) -> Self {
        self.seeder = Some(Box::new(seeder));
        self
    }

    /// Set the effect player (defaults to [`turn_core::NullEffects`])
    pub fn effects(mut self, effects: impl EffectPlayer + 'static) -> Self {
        self.effects = Some(Box::new(effects));
        self
    }

    /// Set the override provider (defaults to all overrides off)
    pub fn overrides(mut self, overrides: impl OverrideProvider + 'static) -> Self {
        self.overrides = Some(Box::new(overrides));
        self
    }

    /// Build the runtime and spawn its frame worker
    ///
    /// Must be called within a tokio runtime.
    pub async fn build(self) -> Result<Runtime<W>> {
        let world = self.world.ok_or(RuntimeError::MissingWorld)?;

        let mut scheduler = TurnScheduler::builder().config(self.config.scheduler.clone());
        if let Some(effects) = self.effects {
            scheduler = scheduler.effects(effects);
        }
        if let Some(overrides) = self.overrides {
            scheduler = scheduler.overrides(overrides);
        }
        let scheduler = scheduler.build()?;

        let (command_tx, command_rx) =
            mpsc::channel::<Command<W>>(self.config.command_buffer_size.max(1));
        let event_bus = crate::events::EventBus::with_capacity(self.config.event_buffer_size);
        let metrics = Arc::new(FrameMetrics::new());

        let handle = RuntimeHandle::new(command_tx, event_bus.clone(), Arc::clone(&metrics));

        let frame_worker = FrameWorker::new(
            scheduler,
            world,
            self.config.frame_interval,
            self.config.watchdog_threshold,
            command_rx,
            event_bus,
            metrics,
        );

        let frame_worker_handle = tokio::spawn(async move {
            frame_worker.run().await;
        });

        info!(
            target: "runtime",
            frame_interval = ?self.config.frame_interval,
            seeder = self.seeder.is_some(),
            "runtime started"
        );

        Ok(Runtime {
            handle,
            seeder: self.seeder,
            config: self.config,
            frame_worker_handle,
        })
    }
}
