//! Grid world the skirmish plays out on.
use std::fmt;

use serde::{Deserialize, Serialize};
use turn_core::Anchor;

/// Identifier of a unit on the grid. The player is always `#0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub const PLAYER: Self = Self(0);
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discrete grid position expressed in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance.
    pub fn distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// One orthogonal step toward `target`, closing the wider axis first.
    pub fn step_toward(self, target: Position) -> Position {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        if dx == 0 && dy == 0 {
            return self;
        }
        if dx.abs() >= dy.abs() {
            Position::new(self.x + dx.signum(), self.y)
        } else {
            Position::new(self.x, self.y + dy.signum())
        }
    }

    pub fn anchor(self) -> Anchor {
        Anchor::new(self.x, self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub position: Position,
    pub health: u32,
}

impl Unit {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Authoritative skirmish state owned by the runtime's frame worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skirmish {
    pub width: i32,
    pub height: i32,
    pub player: Unit,
    pub enemies: Vec<Unit>,
    next_unit: u32,
    spawned: u32,
    defeated: u32,
}

impl Skirmish {
    pub const PLAYER_HEALTH: u32 = 30;
    pub const ENEMY_HEALTH: u32 = 6;

    /// Square grid with the player in the centre.
    pub fn new(size: i32) -> Self {
        let size = size.max(3);
        Self {
            width: size,
            height: size,
            player: Unit {
                id: UnitId::PLAYER,
                position: Position::new(size / 2, size / 2),
                health: Self::PLAYER_HEALTH,
            },
            enemies: Vec::new(),
            next_unit: 1,
            spawned: 0,
            defeated: 0,
        }
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn defeated(&self) -> u32 {
        self.defeated
    }

    pub fn is_player_alive(&self) -> bool {
        self.player.is_alive()
    }

    pub fn enemy(&self, id: UnitId) -> Option<&Unit> {
        self.enemies.iter().find(|unit| unit.id == id)
    }

    fn enemy_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.enemies.iter_mut().find(|unit| unit.id == id)
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = &Unit> {
        self.enemies.iter().filter(|unit| unit.is_alive())
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.player.position == position
            || self
                .living_enemies()
                .any(|unit| unit.position == position)
    }

    fn contains(&self, position: Position) -> bool {
        (0..self.width).contains(&position.x) && (0..self.height).contains(&position.y)
    }

    /// Spawns an enemy on the first free edge tile, scanning clockwise from
    /// the top-left corner past the previous spawn.
    pub fn spawn_enemy(&mut self) -> Option<UnitId> {
        let perimeter = self.edge_tiles();
        let offset = self.spawned as usize;
        let position = (0..perimeter.len())
            .map(|i| perimeter[(offset * 3 + i) % perimeter.len()])
            .find(|&position| !self.is_occupied(position))?;

        let id = UnitId(self.next_unit);
        self.next_unit += 1;
        self.spawned += 1;
        self.enemies.push(Unit {
            id,
            position,
            health: Self::ENEMY_HEALTH,
        });
        Some(id)
    }

    fn edge_tiles(&self) -> Vec<Position> {
        let (w, h) = (self.width, self.height);
        let top = (0..w).map(|x| Position::new(x, 0));
        let right = (1..h).map(|y| Position::new(w - 1, y));
        let bottom = (0..w - 1).rev().map(|x| Position::new(x, h - 1));
        let left = (1..h - 1).rev().map(|y| Position::new(0, y));
        top.chain(right).chain(bottom).chain(left).collect()
    }

    /// Moves an enemy one tile toward the player. Returns the new position,
    /// or `None` when the unit is gone. Blocked moves keep the unit in place.
    pub fn advance_enemy(&mut self, id: UnitId) -> Option<Position> {
        let target = self.player.position;
        let current = self.enemy(id).filter(|unit| unit.is_alive())?.position;
        if current.distance(target) <= 1 {
            return Some(current);
        }

        let next = current.step_toward(target);
        if !self.contains(next) || self.is_occupied(next) {
            return Some(current);
        }
        if let Some(unit) = self.enemy_mut(id) {
            unit.position = next;
        }
        Some(next)
    }

    /// Moves the player one tile toward the nearest living enemy.
    pub fn advance_player(&mut self) -> Option<Position> {
        let target = self.nearest_enemy()?.position;
        let next = self.player.position.step_toward(target);
        if self.player.position.distance(target) <= 1 || self.is_occupied(next) {
            return Some(self.player.position);
        }
        self.player.position = next;
        Some(next)
    }

    pub fn nearest_enemy(&self) -> Option<&Unit> {
        let from = self.player.position;
        self.living_enemies()
            .min_by_key(|unit| (unit.position.distance(from), unit.id))
    }

    /// Damages the player; returns remaining health.
    pub fn damage_player(&mut self, amount: u32) -> u32 {
        self.player.health = self.player.health.saturating_sub(amount);
        self.player.health
    }

    /// Damages an enemy; returns remaining health, or `None` for unknown or
    /// already defeated units.
    pub fn damage_enemy(&mut self, id: UnitId, amount: u32) -> Option<u32> {
        let unit = self.enemy_mut(id).filter(|unit| unit.is_alive())?;
        unit.health = unit.health.saturating_sub(amount);
        let remaining = unit.health;
        if remaining == 0 {
            self.defeated += 1;
        }
        Some(remaining)
    }

    /// Removes defeated enemies; returns how many were removed.
    pub fn clear_defeated(&mut self) -> usize {
        let before = self.enemies.len();
        self.enemies.retain(Unit::is_alive);
        before - self.enemies.len()
    }
}
