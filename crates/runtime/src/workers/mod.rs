//! Worker tasks that back the runtime orchestration.
//!
//! The frame worker owns the scheduler and the world; the watchdog and the
//! metrics are helpers it drives on every frame.

mod frame;
mod metrics;
mod watchdog;

pub use frame::{Command, FrameWorker, RuntimeStatus};
pub use metrics::{FrameMetrics, MetricsSnapshot};
