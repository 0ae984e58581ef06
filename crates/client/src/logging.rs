//! Tracing subscriber setup for the client binary.
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Setup logging to stderr and, when `log_dir` is set, to a session log file.
///
/// `RUST_LOG` refines the default `info` level. The returned guard flushes the
/// file writer on drop, so keep it alive for the whole session.
pub fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::never(dir, "tactics.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("tracing subscriber already initialised")?;

    if let Some(dir) = log_dir {
        tracing::info!("Log file: {}/tactics.log", dir.display());
    }

    Ok(guard)
}
