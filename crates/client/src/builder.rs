//! Client builder with dependency injection pattern.

use anyhow::{Context, Result};
use runtime::Runtime;

use crate::Client;
use crate::config::ClientConfig;
use crate::effects::PolledEffects;
use crate::world::Skirmish;

/// Builder for constructing a [`Client`].
///
/// Configuration defaults to [`ClientConfig::default`]; the initial world
/// defaults to an empty grid of the configured size.
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<ClientConfig>,
    world: Option<Skirmish>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Start from a prepared world instead of an empty grid.
    pub fn world(mut self, world: Skirmish) -> Self {
        self.world = Some(world);
        self
    }

    /// Build the client and start its runtime.
    ///
    /// Must be called within a tokio runtime.
    pub async fn build(self) -> Result<Client> {
        let config = self.config.unwrap_or_default();
        let world = self
            .world
            .unwrap_or_else(|| Skirmish::new(config.skirmish.grid_size));

        let runtime = Runtime::builder()
            .config(config.runtime.clone())
            .world(world)
            .seeder(config.skirmish.seeder.clone())
            .effects(PolledEffects::new(config.skirmish.effect_polls))
            .overrides(config.overrides)
            .build()
            .await
            .context("failed to start runtime")?;

        Ok(Client { runtime })
    }
}
