//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use runtime::RuntimeConfig;
use turn_core::DebugFlags;

use crate::seeder::SkirmishSeeder;

/// Configuration required to bootstrap the runtime and the skirmish.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub runtime: RuntimeConfig,
    pub skirmish: SkirmishConfig,
    pub overrides: DebugFlags,
    /// Directory for the session log file; stderr only when unset.
    pub log_dir: Option<PathBuf>,
    /// Where to write the JSON session report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig {
                max_turns: Some(Self::DEFAULT_MAX_TURNS),
                ..RuntimeConfig::default()
            },
            skirmish: SkirmishConfig::default(),
            overrides: DebugFlags::default(),
            log_dir: None,
            report_path: None,
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_MAX_TURNS: u64 = 20;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `TACTICS_RUNTIME_CONFIG` - JSON file with a base `RuntimeConfig`
    /// - `TACTICS_TURNS` - Turns to play, 0 for unlimited (default: 20)
    /// - `TACTICS_FRAME_MS` - Frame interval in milliseconds (default: 16)
    /// - `TACTICS_SPEED` - Game clock speed (default: 1.0)
    /// - `TACTICS_MAX_STEPS` - Action steps per tick (default: 1024)
    /// - `TACTICS_WATCHDOG_MS` - Stuck suspension threshold, 0 disables (default: 5000)
    /// - `TACTICS_GRID` - Grid side length (default: 9)
    /// - `TACTICS_EFFECT_POLLS` - Frames each effect plays for (default: 4)
    /// - `TACTICS_WAVE_SIZE` - Enemies per wave (default: 2)
    /// - `TACTICS_INPUT_MS` - Player input window in milliseconds (default: 250)
    /// - `TACTICS_INVINCIBLE`, `TACTICS_FORCE_SKIP`, `TACTICS_INFINITE_TIMER` - Debug overrides
    /// - `TACTICS_LOG_DIR` - Directory for the session log file
    /// - `TACTICS_REPORT` - Path for the JSON session report
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup("TACTICS_RUNTIME_CONFIG") {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read runtime config {path}"))?;
            let base: RuntimeConfig = serde_json::from_str(&text)
                .with_context(|| format!("invalid runtime config {path}"))?;
            config.runtime = RuntimeConfig {
                max_turns: base.max_turns.or(config.runtime.max_turns),
                ..base
            };
        }

        let runtime = &mut config.runtime;
        if let Some(turns) = parse::<u64>(&lookup, "TACTICS_TURNS")? {
            runtime.max_turns = (turns > 0).then_some(turns);
        }
        if let Some(ms) = parse::<u64>(&lookup, "TACTICS_FRAME_MS")? {
            runtime.frame_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(speed) = parse::<f64>(&lookup, "TACTICS_SPEED")? {
            runtime.scheduler.speed = speed;
        }
        if let Some(steps) = parse::<usize>(&lookup, "TACTICS_MAX_STEPS")? {
            runtime.scheduler.max_steps_per_tick = steps;
        }
        if let Some(ms) = parse::<u64>(&lookup, "TACTICS_WATCHDOG_MS")? {
            runtime.watchdog_threshold = (ms > 0).then(|| Duration::from_millis(ms));
        }

        let skirmish = &mut config.skirmish;
        if let Some(size) = parse::<i32>(&lookup, "TACTICS_GRID")? {
            skirmish.grid_size = size.max(3);
        }
        if let Some(polls) = parse::<u32>(&lookup, "TACTICS_EFFECT_POLLS")? {
            skirmish.effect_polls = polls;
        }
        if let Some(wave) = parse::<u32>(&lookup, "TACTICS_WAVE_SIZE")? {
            skirmish.seeder.wave_size = wave;
        }
        if let Some(ms) = parse::<u64>(&lookup, "TACTICS_INPUT_MS")? {
            skirmish.seeder.input_window = Duration::from_millis(ms);
        }

        let overrides = &mut config.overrides;
        overrides.invincible = flag(&lookup, "TACTICS_INVINCIBLE")?;
        overrides.force_skip = flag(&lookup, "TACTICS_FORCE_SKIP")?;
        overrides.infinite_timer = flag(&lookup, "TACTICS_INFINITE_TIMER")?;

        config.log_dir = lookup("TACTICS_LOG_DIR").map(PathBuf::from);
        config.report_path = lookup("TACTICS_REPORT").map(PathBuf::from);

        Ok(config)
    }
}

#[derive(Clone, Debug)]
pub struct SkirmishConfig {
    pub grid_size: i32,
    /// Frames an effect plays for before it finishes.
    pub effect_polls: u32,
    pub seeder: SkirmishSeeder,
}

impl Default for SkirmishConfig {
    fn default() -> Self {
        Self {
            grid_size: 9,
            effect_polls: 4,
            seeder: SkirmishSeeder::default(),
        }
    }
}

fn parse<T>(read: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    read(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .with_context(|| format!("invalid value for {key}: {value:?}"))
        })
        .transpose()
}

/// Set-but-empty counts as enabled.
fn flag(read: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool> {
    match read(key) {
        Some(value) if value.trim().is_empty() => Ok(true),
        Some(_) => Ok(parse::<bool>(read, key)?.unwrap_or(false)),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = load(&[]).unwrap();

        assert_eq!(config.runtime.max_turns, Some(ClientConfig::DEFAULT_MAX_TURNS));
        assert_eq!(config.overrides, DebugFlags::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_overrides_and_limits() {
        let config = load(&[
            ("TACTICS_TURNS", "0"),
            ("TACTICS_WATCHDOG_MS", "0"),
            ("TACTICS_SPEED", "2.5"),
            ("TACTICS_INVINCIBLE", ""),
            ("TACTICS_FORCE_SKIP", "false"),
            ("TACTICS_GRID", "1"),
        ])
        .unwrap();

        assert_eq!(config.runtime.max_turns, None);
        assert_eq!(config.runtime.watchdog_threshold, None);
        assert_eq!(config.runtime.scheduler.speed, 2.5);
        assert!(config.overrides.invincible);
        assert!(!config.overrides.force_skip);
        assert_eq!(config.skirmish.grid_size, 3);
    }

    #[test]
    fn rejects_malformed_numbers() {
        let error = load(&[("TACTICS_FRAME_MS", "soon")]).unwrap_err();
        assert!(error.to_string().contains("TACTICS_FRAME_MS"));
    }
}
