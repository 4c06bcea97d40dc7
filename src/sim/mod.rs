//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod arena;
pub mod field;
pub mod geometry;
pub mod player;
pub mod projectile;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod turn;

pub use arena::Arena;
pub use field::{FieldEntry, FieldKind, FieldRules, PlacementBand, SpatialField};
pub use geometry::{Circle, Rect, point_in_circle, segment_intersects_circle};
pub use player::Player;
pub use projectile::{Projectile, ProjectileId, ProjectileRules, ProjectileSet, constrain_direction};
pub use snapshot::{PlayerView, PowerupView, ProjectileView, RenderSnapshot};
pub use state::{
    GameEvent, MapTheme, MatchPhase, Obstacle, ObstacleField, PowerupField, PowerupKind, Score, Side,
};
pub use tick::InputEvent;
pub use turn::{TurnCoordinator, TurnState};
