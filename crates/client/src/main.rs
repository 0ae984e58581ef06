//! Tactics client binary.
//!
//! Composition root: loads configuration from the environment (and `.env`),
//! sets up logging, and plays a headless skirmish on the turn runtime.
//!
//! # Examples
//!
//! ```bash
//! # Ten turns, invincible player, JSON report
//! TACTICS_TURNS=10 TACTICS_INVINCIBLE=1 TACTICS_REPORT=report.json \
//!     cargo run -p tactics-client
//! ```

use anyhow::{Context, Result};
use tactics_client::{Client, ClientConfig, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env().context("failed to load configuration")?;
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!("Starting tactics client");
    tracing::info!(
        max_turns = ?config.runtime.max_turns,
        frame_interval = ?config.runtime.frame_interval,
        overrides = ?config.overrides,
        "configuration loaded"
    );

    let report_path = config.report_path.clone();
    let client = Client::builder().config(config).build().await?;
    let report = client.run().await?;

    if let Some(path) = report_path {
        report.write_json(&path)?;
        tracing::info!("Session report written to {}", path.display());
    }

    Ok(())
}
