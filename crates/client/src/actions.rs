//! Skirmish actions scheduled into the turn phases.
//!
//! Enemy turns: `SpawnWave` and `PlanEnemyTurn` run in `Start` and fan out one
//! `MoveEnemy` (Move) and one `Strike` (Action) per living enemy. Player turns
//! wait out an input window, then `PlayerAdvance` and `PlayerStrike`.
//! `Cleanup` closes every turn.
use tracing::{debug, info};
use turn_core::{
    Action, ActionContext, ActionError, EffectRequest, Phase, PlayEffect, StepResult, Suspension,
};

use crate::world::{Skirmish, UnitId};

type Ctx<'a> = ActionContext<'a, Skirmish>;

/// Steps an in-flight effect, or finishes immediately when there is none.
fn await_effect(effect: &mut Option<PlayEffect>, ctx: &mut Ctx<'_>) -> StepResult {
    match effect {
        Some(effect) => Action::<Skirmish>::step(effect, ctx),
        None => Ok(Suspension::Done),
    }
}

/// Spawns up to `count` enemies on free edge tiles.
#[derive(Clone, Debug)]
pub struct SpawnWave {
    pub count: u32,
}

impl Action<Skirmish> for SpawnWave {
    fn step(&mut self, ctx: &mut Ctx<'_>) -> StepResult {
        let turn = ctx.turn_number();
        let world = ctx.world_mut();
        let spawned = (0..self.count)
            .map_while(|_| world.spawn_enemy())
            .count();
        info!(target: "tactics::actions", turn, spawned, "enemy wave spawned");
        Ok(Suspension::Done)
    }
}

/// Gives every living enemy a move and a strike for this turn.
#[derive(Clone, Debug)]
pub struct PlanEnemyTurn {
    pub damage: u32,
}

impl Action<Skirmish> for PlanEnemyTurn {
    fn step(&mut self, ctx: &mut Ctx<'_>) -> StepResult {
        let enemies: Vec<UnitId> = ctx.world().living_enemies().map(|unit| unit.id).collect();
        for unit in enemies {
            ctx.enqueue(Phase::Move, MoveEnemy::new(unit))
                .map_err(|error| ActionError::with_source("failed to plan move", error))?;
            ctx.enqueue(Phase::Action, Strike::new(unit, self.damage))
                .map_err(|error| ActionError::with_source("failed to plan strike", error))?;
        }
        Ok(Suspension::Done)
    }
}

/// Moves one enemy a tile toward the player and waits for the move effect.
#[derive(Clone, Debug)]
pub struct MoveEnemy {
    unit: UnitId,
    effect: Option<PlayEffect>,
    started: bool,
}

impl MoveEnemy {
    pub fn new(unit: UnitId) -> Self {
        Self {
            unit,
            effect: None,
            started: false,
        }
    }
}

impl Action<Skirmish> for MoveEnemy {
    fn step(&mut self, ctx: &mut Ctx<'_>) -> StepResult {
        if !self.started {
            self.started = true;
            // Defeated units simply stay put.
            let Some(position) = ctx.world_mut().advance_enemy(self.unit) else {
                return Ok(Suspension::Done);
            };
            debug!(target: "tactics::actions", unit = %self.unit, %position, "enemy moved");
            self.effect = Some(PlayEffect::new(
                EffectRequest::new("enemy_move").at(position.anchor()),
            ));
        }
        await_effect(&mut self.effect, ctx)
    }
}

/// An enemy attacks the player if adjacent.
///
/// A killing blow jumps the turn straight to `End`, dropping the remaining
/// strikes.
#[derive(Clone, Debug)]
pub struct Strike {
    attacker: UnitId,
    damage: u32,
    effect: Option<PlayEffect>,
    started: bool,
}

impl Strike {
    pub fn new(attacker: UnitId, damage: u32) -> Self {
        Self {
            attacker,
            damage,
            effect: None,
            started: false,
        }
    }
}

impl Action<Skirmish> for Strike {
    fn step(&mut self, ctx: &mut Ctx<'_>) -> StepResult {
        if self.started {
            return await_effect(&mut self.effect, ctx);
        }
        self.started = true;

        let world = ctx.world();
        let attacker = world
            .enemy(self.attacker)
            .ok_or_else(|| ActionError::new(format!("attacker {} is gone", self.attacker)))?;
        if !attacker.is_alive() || attacker.position.distance(world.player.position) > 1 {
            return Ok(Suspension::Done);
        }
        let anchor = world.player.position.anchor();

        if ctx.overrides().invincible() {
            debug!(target: "tactics::actions", attacker = %self.attacker, "strike ignored (invincible)");
        } else {
            let remaining = ctx.world_mut().damage_player(self.damage);
            info!(
                target: "tactics::actions",
                attacker = %self.attacker,
                damage = self.damage,
                remaining,
                "player hit"
            );
            if remaining == 0 && ctx.phase() < Phase::End {
                info!(target: "tactics::actions", "player defeated");
                if let Err(error) = ctx.request_phase_jump(Phase::End) {
                    debug!(target: "tactics::actions", %error, "no end phase to jump to");
                }
            }
        }

        self.effect = Some(PlayEffect::new(EffectRequest::new("strike").at(anchor)));
        await_effect(&mut self.effect, ctx)
    }
}

/// The player steps toward the nearest enemy.
#[derive(Clone, Debug, Default)]
pub struct PlayerAdvance;

impl Action<Skirmish> for PlayerAdvance {
    fn step(&mut self, ctx: &mut Ctx<'_>) -> StepResult {
        if let Some(position) = ctx.world_mut().advance_player() {
            debug!(target: "tactics::actions", %position, "player moved");
        }
        Ok(Suspension::Done)
    }
}

/// The player hits the nearest adjacent enemy.
#[derive(Clone, Debug)]
pub struct PlayerStrike {
    pub damage: u32,
}

impl Action<Skirmish> for PlayerStrike {
    fn step(&mut self, ctx: &mut Ctx<'_>) -> StepResult {
        let world = ctx.world();
        let Some(target) = world
            .nearest_enemy()
            .filter(|unit| unit.position.distance(world.player.position) <= 1)
            .map(|unit| unit.id)
        else {
            return Ok(Suspension::Done);
        };

        if let Some(remaining) = ctx.world_mut().damage_enemy(target, self.damage) {
            info!(
                target: "tactics::actions",
                target_unit = %target,
                damage = self.damage,
                remaining,
                "enemy hit"
            );
        }
        Ok(Suspension::Done)
    }
}

/// Removes defeated enemies at the end of a turn.
#[derive(Clone, Debug, Default)]
pub struct Cleanup;

impl Action<Skirmish> for Cleanup {
    fn step(&mut self, ctx: &mut Ctx<'_>) -> StepResult {
        let removed = ctx.world_mut().clear_defeated();
        if removed > 0 {
            debug!(target: "tactics::actions", removed, "defeated enemies cleared");
        }
        Ok(Suspension::Done)
    }
}
