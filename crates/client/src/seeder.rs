//! Turn seeding for the headless skirmish.
use std::time::Duration;

use async_trait::async_trait;
use runtime::{Result, SeedRequest, TurnSeeder};
use tracing::info;
use turn_core::{Delay, Phase, Sequence, Side, TurnSeed};

use crate::actions::{Cleanup, PlanEnemyTurn, PlayerAdvance, PlayerStrike, SpawnWave};
use crate::world::Skirmish;

/// Alternates player and enemy turns until the player falls.
#[derive(Clone, Debug)]
pub struct SkirmishSeeder {
    /// Enemies spawned per wave.
    pub wave_size: u32,
    /// Enemy turns between waves; a wave also spawns whenever the grid is clear.
    pub wave_interval: u64,
    /// Game time the player's input timer runs before acting.
    pub input_window: Duration,
    pub player_damage: u32,
    pub enemy_damage: u32,
}

impl Default for SkirmishSeeder {
    fn default() -> Self {
        Self {
            wave_size: 2,
            wave_interval: 3,
            input_window: Duration::from_millis(250),
            player_damage: 3,
            enemy_damage: 2,
        }
    }
}

impl SkirmishSeeder {
    fn enemy_turn(&self, request: &SeedRequest, world: &Skirmish) -> TurnSeed<Skirmish> {
        let enemy_turns = request.turn / 2;
        let wave_due = world.living_enemies().next().is_none()
            || enemy_turns % self.wave_interval.max(1) == 0;

        let mut seed = TurnSeed::new(Side::Enemy);
        if wave_due {
            seed.push(Phase::Start, SpawnWave {
                count: self.wave_size,
            });
        }
        seed.with(Phase::Start, PlanEnemyTurn {
            damage: self.enemy_damage,
        })
        .with(Phase::End, Cleanup)
    }

    fn player_turn(&self) -> TurnSeed<Skirmish> {
        let act = Sequence::<Skirmish>::new("PlayerAct", Vec::new())
            .then(Delay::timer(self.input_window))
            .then(PlayerAdvance);
        TurnSeed::new(Side::Player)
            .with(Phase::Move, act)
            .with(Phase::Action, PlayerStrike {
                damage: self.player_damage,
            })
            .with(Phase::End, Cleanup)
    }
}

#[async_trait]
impl TurnSeeder<Skirmish> for SkirmishSeeder {
    async fn seed(
        &self,
        request: SeedRequest,
        world: &Skirmish,
    ) -> Result<Option<TurnSeed<Skirmish>>> {
        if !world.is_player_alive() {
            info!(
                target: "tactics::seeder",
                turn = request.turn,
                defeated = world.defeated(),
                "player has fallen, ending session"
            );
            return Ok(None);
        }

        let seed = match request.next_side() {
            Side::Player => self.player_turn(),
            Side::Enemy => self.enemy_turn(&request, world),
        };
        Ok(Some(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn alternates_sides_starting_with_player() {
        let seeder = SkirmishSeeder::default();
        let world = Skirmish::new(7);

        let first = seeder
            .seed(SeedRequest { turn: 1, previous: None }, &world)
            .await
            .unwrap()
            .unwrap();
        let second = seeder
            .seed(
                SeedRequest {
                    turn: 2,
                    previous: Some(Side::Player),
                },
                &world,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.side(), Side::Player);
        assert_eq!(second.side(), Side::Enemy);
        // Empty grid: the enemy turn spawns a wave before planning.
        assert_eq!(second.len(), 3);
    }

    #[tokio::test]
    async fn ends_session_once_player_falls() {
        let seeder = SkirmishSeeder::default();
        let mut world = Skirmish::new(7);
        world.damage_player(Skirmish::PLAYER_HEALTH);

        let seed = seeder
            .seed(SeedRequest { turn: 9, previous: Some(Side::Enemy) }, &world)
            .await
            .unwrap();
        assert!(seed.is_none());
    }
}
