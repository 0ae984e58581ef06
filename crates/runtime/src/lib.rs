//! Async runtime hosting a turn scheduler.
//!
//! This crate wires together the turn seeder abstraction, the frame worker,
//! and a topic-based event bus into a cohesive runtime API. Consumers embed
//! [`Runtime`] to play turns, subscribe to events, and steer the scheduler
//! through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod runtime;

mod workers;

pub use api::{EmptySeeder, Result, RuntimeError, RuntimeHandle, SeedRequest, TurnSeeder};
pub use events::{Event, EventBus, Topic, TurnEnd, TurnSummary, WatchdogReport};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::{Command, FrameMetrics, MetricsSnapshot, RuntimeStatus};
