//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! steering the scheduler or streaming events from specific topics.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use turn_core::{Action, ActionId, BoxedAction, DebugFlags, Diagnostic, Phase, TurnSeed};

use super::errors::{Result, RuntimeError};
use super::seeder::SeedRequest;
use crate::events::{Event, EventBus, Topic};
use crate::workers::{Command, FrameMetrics, RuntimeStatus};

/// Client-facing handle to interact with the runtime
pub struct RuntimeHandle<W> {
    command_tx: mpsc::Sender<Command<W>>,
    event_bus: EventBus,
    metrics: Arc<FrameMetrics>,
}

impl<W> Clone for RuntimeHandle<W> {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            event_bus: self.event_bus.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<W> RuntimeHandle<W>
where
    W: Send + 'static,
{
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command<W>>,
        event_bus: EventBus,
        metrics: Arc<FrameMetrics>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            metrics,
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command<W>,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Prepare the next turn - returns the seed request and a world snapshot
    pub async fn prepare_turn(&self) -> Result<(SeedRequest, W)> {
        self.request(|reply| Command::PrepareTurn { reply }).await?
    }

    /// Start a new turn; only legal while the scheduler is idle
    pub async fn advance_turn(&self, seed: TurnSeed<W>) -> Result<u64> {
        self.request(|reply| Command::AdvanceTurn { seed, reply })
            .await?
    }

    /// Append an action to a phase of the active turn
    pub async fn enqueue(
        &self,
        phase: Phase,
        action: impl Action<W> + 'static,
    ) -> Result<ActionId> {
        let action: BoxedAction<W> = Box::new(action);
        self.request(|reply| Command::Enqueue {
            phase,
            action,
            reply,
        })
        .await?
    }

    /// Jump the active turn forward to `phase`, discarding skipped actions
    pub async fn request_phase_jump(&self, phase: Phase) -> Result<()> {
        self.request(|reply| Command::RequestPhaseJump { phase, reply })
            .await?
    }

    /// Force the scheduler back to idle, abandoning the active turn
    pub async fn cancel_turn(&self) -> Result<u64> {
        self.request(|reply| Command::CancelTurn { reply }).await?
    }

    pub async fn set_paused(&self, paused: bool) -> Result<()> {
        self.request(|reply| Command::SetPaused { paused, reply })
            .await
    }

    pub async fn set_speed(&self, speed: f64) -> Result<()> {
        self.request(|reply| Command::SetSpeed { speed, reply })
            .await?
    }

    pub async fn set_overrides(&self, flags: DebugFlags) -> Result<()> {
        self.request(|reply| Command::SetOverrides { flags, reply })
            .await
    }

    /// Query the current scheduler status (read-only snapshot)
    pub async fn status(&self) -> Result<RuntimeStatus> {
        self.request(|reply| Command::QueryStatus { reply }).await
    }

    /// Query a clone of the current world (read-only snapshot)
    pub async fn query_world(&self) -> Result<W> {
        self.request(|reply| Command::QueryWorld { reply }).await
    }

    /// Diagnostics still retained by the scheduler, oldest first
    pub async fn diagnostics(&self) -> Result<Vec<Diagnostic>> {
        self.request(|reply| Command::QueryDiagnostics { reply })
            .await
    }

    /// Ask the frame worker to stop. Later commands fail with
    /// [`RuntimeError::CommandChannelClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Turn` - Turn, phase, and action progress
    /// - `Topic::Diagnostics` - Faults, rejections, discarded actions
    /// - `Topic::Watchdog` - Actions suspended past the watchdog threshold
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut turn_rx = handle.subscribe(Topic::Turn);
    /// while let Ok(event) = turn_rx.recv().await {
    ///     // Handle turn events
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Frame loop counters, readable without a round-trip to the worker
    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }
}
