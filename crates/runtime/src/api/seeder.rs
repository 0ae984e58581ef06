//! Asynchronous abstraction for sourcing each turn's initial actions.
//!
//! Runtime users plug in [`TurnSeeder`] implementations so turns can be seeded
//! from player input, scripted fixtures, or AI policies.
use async_trait::async_trait;
use turn_core::{Side, TurnSeed};

use super::errors::Result;

/// What the runtime knows about the turn it is about to start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedRequest {
    /// Number the turn will get once started.
    pub turn: u64,
    /// Side that took the previous turn, if any.
    pub previous: Option<Side>,
}

impl SeedRequest {
    /// Alternating side: the opponent of the previous side, the player first.
    pub fn next_side(&self) -> Side {
        self.previous.map_or(Side::Player, Side::opponent)
    }
}

/// Trait for providing a turn seed based on the current world.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - Enemy AI intent
/// - Scripted/replayed sessions
/// - Testing fixtures
#[async_trait]
pub trait TurnSeeder<W>: Send + Sync
where
    W: Send + Sync + 'static,
{
    /// Provide the seed for the next turn.
    ///
    /// # Arguments
    /// * `request` - Number and previous side of the turn to seed
    /// * `world` - Read-only snapshot of the world taken while idle
    ///
    /// # Returns
    /// `Ok(None)` ends the session.
    async fn seed(&self, request: SeedRequest, world: &W) -> Result<Option<TurnSeed<W>>>;
}

/// Seeds empty turns on alternating sides. Useful for testing or as a fallback.
pub struct EmptySeeder;

#[async_trait]
impl<W> TurnSeeder<W> for EmptySeeder
where
    W: Send + Sync + 'static,
{
    async fn seed(&self, request: SeedRequest, _world: &W) -> Result<Option<TurnSeed<W>>> {
        Ok(Some(TurnSeed::new(request.next_side())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_side_alternates_starting_with_player() {
        let first = SeedRequest {
            turn: 1,
            previous: None,
        };
        assert_eq!(first.next_side(), Side::Player);

        let second = SeedRequest {
            turn: 2,
            previous: Some(Side::Player),
        };
        assert_eq!(second.next_side(), Side::Enemy);
    }
}
