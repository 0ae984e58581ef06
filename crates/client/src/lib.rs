//! Headless tactics client orchestrating the runtime and a grid skirmish.
//!
//! # Architecture
//!
//! ```text
//! Client (Top-level container)
//!   ├─→ Runtime (frame worker owning the scheduler and the Skirmish world)
//!   ├─→ SkirmishSeeder (alternating player and enemy turns)
//!   └─→ Monitor task (diagnostics and watchdog reports)
//! ```
//!
//! The client plays turns until the player falls or the configured turn
//! limit is reached, then returns a [`SessionReport`].

pub mod actions;
mod builder;
pub mod config;
pub mod effects;
pub mod logging;
pub mod seeder;
pub mod world;

pub use builder::ClientBuilder;
pub use config::{ClientConfig, SkirmishConfig};
pub use world::Skirmish;

use std::path::Path;

use anyhow::{Context, Result};
use runtime::{Event, MetricsSnapshot, Runtime, Topic, TurnEnd, TurnSummary, WatchdogReport};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use turn_core::Diagnostic;

/// Top-level client container.
pub struct Client {
    runtime: Runtime<Skirmish>,
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub turns: Vec<TurnSummary>,
    pub metrics: MetricsSnapshot,
    pub world: Skirmish,
    pub diagnostics: Vec<Diagnostic>,
    pub watchdog_reports: Vec<WatchdogReport>,
}

impl SessionReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create report {}", path.display()))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)
            .context("failed to write session report")?;
        Ok(())
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Play the session to completion.
    ///
    /// Diagnostics and watchdog reports are logged as they arrive and
    /// collected into the report.
    pub async fn run(self) -> Result<SessionReport> {
        let mut runtime = self.runtime;
        let handle = runtime.handle();

        let monitor = tokio::spawn(monitor(
            handle.subscribe(Topic::Diagnostics),
            handle.subscribe(Topic::Watchdog),
        ));

        let turns = runtime.run().await.context("session aborted")?;
        for summary in &turns {
            match summary.end {
                TurnEnd::Completed { ticks } => {
                    info!(turn = summary.turn, side = %summary.side, ticks, "turn completed")
                }
                TurnEnd::Cancelled { abandoned } => {
                    info!(turn = summary.turn, side = %summary.side, abandoned, "turn cancelled")
                }
                TurnEnd::Unobserved => {
                    info!(turn = summary.turn, side = %summary.side, "turn ended unobserved")
                }
            }
        }

        let world = handle.query_world().await.context("failed to query world")?;
        let metrics = handle.metrics().snapshot();

        // Dropping every bus owner closes the topics and ends the monitor.
        drop(handle);
        runtime.shutdown().await.context("runtime shutdown failed")?;
        let (diagnostics, watchdog_reports) =
            monitor.await.context("monitor task failed")?;

        info!(
            turns = turns.len(),
            player_health = world.player.health,
            defeated = world.defeated(),
            diagnostics = diagnostics.len(),
            "session finished"
        );

        Ok(SessionReport {
            turns,
            metrics,
            world,
            diagnostics,
            watchdog_reports,
        })
    }
}

async fn monitor(
    mut diagnostics_rx: broadcast::Receiver<Event>,
    mut watchdog_rx: broadcast::Receiver<Event>,
) -> (Vec<Diagnostic>, Vec<WatchdogReport>) {
    let mut diagnostics = Vec::new();
    let mut reports = Vec::new();
    let mut diagnostics_open = true;
    let mut watchdog_open = true;

    loop {
        tokio::select! {
            event = diagnostics_rx.recv(), if diagnostics_open => match event {
                Ok(Event::Diagnostic(diagnostic)) => {
                    warn!(
                        target: "tactics::monitor",
                        turn = ?diagnostic.turn,
                        code = diagnostic.cause.code(),
                        "{}", diagnostic.cause
                    );
                    diagnostics.push(diagnostic);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: "tactics::monitor", skipped, "diagnostics lagged");
                }
                Err(RecvError::Closed) => diagnostics_open = false,
            },
            event = watchdog_rx.recv(), if watchdog_open => match event {
                Ok(Event::Watchdog(report)) => reports.push(report),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: "tactics::monitor", skipped, "watchdog reports lagged");
                }
                Err(RecvError::Closed) => watchdog_open = false,
            },
            else => break,
        }
    }

    (diagnostics, reports)
}
