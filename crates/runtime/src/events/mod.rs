//! Topic-based event bus for runtime events.
//!
//! The frame worker forwards the scheduler's turn events and diagnostics, plus
//! its own watchdog reports, to topics consumers subscribe to individually.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{TurnEnd, TurnSummary, WatchdogReport};
