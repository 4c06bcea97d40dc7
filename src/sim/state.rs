//! Shared match types
//!
//! Small value types used across the simulation: sides, score, phase,
//! field contents and the per-tick event stream.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::field::{FieldKind, SpatialField};
use super::projectile::ProjectileId;

/// Which screen edge a player patrols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Horizontal direction this side fires in (+1 toward the right edge)
    pub fn forward(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    /// Index into per-side arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Active gameplay
    Playing,
    /// Simulation frozen, last state still rendered
    Paused,
    /// A side reached the win score
    Over { winner: Side },
}

/// Points per side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn award(&mut self, side: Side) -> u32 {
        let points = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        *points += 1;
        *points
    }
}

/// Map skin, picked per match; decides background and obstacle art
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapTheme {
    /// Bushes on grass
    Grass,
    /// Igloos on snow
    Snow,
    /// Boulders on dirt
    Dirt,
}

impl MapTheme {
    pub const ALL: [MapTheme; 3] = [MapTheme::Grass, MapTheme::Snow, MapTheme::Dirt];

    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Breakable cover; all obstacles in a match look alike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle;

impl FieldKind for Obstacle {
    fn roll<R: Rng + ?Sized>(_rng: &mut R) -> Self {
        Obstacle
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Splits the projectile into three
    Bomb,
    /// Retargets the projectile at the opponent; a hit freezes them
    Freeze,
    /// Doubles the projectile's footprint
    BigBullet,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 3] = [PowerupKind::Bomb, PowerupKind::Freeze, PowerupKind::BigBullet];
}

impl FieldKind for PowerupKind {
    fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

pub type ObstacleField = SpatialField<Obstacle>;
pub type PowerupField = SpatialField<PowerupKind>;

/// Things that happened during a tick, drained by audio and UI layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Fired {
        side: Side,
        projectile: ProjectileId,
    },
    /// Gunless fire input reversed the patrol direction
    Dodged { side: Side },
    ObstacleBounce {
        projectile: ProjectileId,
        obstacle: u32,
    },
    PowerupActivated {
        projectile: ProjectileId,
        owner: Side,
        kind: PowerupKind,
    },
    Hit {
        shooter: Side,
        target: Side,
        score: Score,
    },
    Frozen { side: Side, until: u64 },
    /// Both sides got their guns back
    Reloaded,
    Paused { paused: bool },
    MatchOver { winner: Side },
}
