//! Read-only per-tick view for renderers
//!
//! The arena rebuilds one of these at the end of every tick. Renderers get a
//! consistent, owned copy and never touch live simulation state, so a copy
//! can be sent to another thread.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::geometry::{Circle, Rect};
use super::player::Player;
use super::projectile::ProjectileId;
use super::state::{MapTheme, MatchPhase, PowerupKind, Score, Side};
use super::turn::TurnState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub side: Side,
    pub rect: Rect,
    pub has_gun: bool,
    pub frozen: bool,
    /// Flash while set
    pub invincible: bool,
    /// A freeze shot is homing on this player
    pub targeted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: ProjectileId,
    pub owner: Side,
    pub parent: Option<ProjectileId>,
    pub rect: Rect,
    pub rotation: f32,
    pub scale: f32,
    pub freezing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupView {
    pub id: u32,
    pub center: Vec2,
    pub radius: f32,
    pub kind: PowerupKind,
    /// Past its spawn grace window
    pub armed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub tick: u64,
    pub phase: MatchPhase,
    pub theme: MapTheme,
    pub score: Score,
    pub turn: TurnState,
    pub players: [PlayerView; 2],
    pub projectiles: Vec<ProjectileView>,
    pub obstacles: Vec<Circle>,
    pub powerups: Vec<PowerupView>,
}

impl PlayerView {
    pub fn of(player: &Player, now: u64) -> Self {
        Self {
            side: player.side,
            rect: player.rect,
            has_gun: player.has_gun,
            frozen: player.is_frozen(now),
            invincible: player.is_invincible(now),
            targeted: player.marked_by.is_some(),
        }
    }
}

impl RenderSnapshot {
    /// Players only, before anything has been placed
    pub fn blank(players: &[Player; 2], theme: MapTheme) -> Self {
        Self {
            tick: 0,
            phase: MatchPhase::Playing,
            theme,
            score: Score::default(),
            turn: TurnState::Idle,
            players: [PlayerView::of(&players[0], 0), PlayerView::of(&players[1], 0)],
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            powerups: Vec::new(),
        }
    }

    pub fn capture(arena: &Arena) -> Self {
        let now = arena.now;
        let player_view = |side: Side| PlayerView::of(arena.player(side), now);

        Self {
            tick: now,
            phase: arena.phase,
            theme: arena.theme,
            score: arena.score,
            turn: arena.turns.state(),
            players: [player_view(Side::Left), player_view(Side::Right)],
            projectiles: arena
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    owner: p.owner,
                    parent: p.parent,
                    rect: p.rect,
                    rotation: p.rotation,
                    scale: p.scale,
                    freezing: p.freeze_target.is_some(),
                })
                .collect(),
            obstacles: arena.obstacles.circles(),
            powerups: arena
                .powerups
                .live()
                .iter()
                .map(|e| PowerupView {
                    id: e.id,
                    center: e.circle.center,
                    radius: e.circle.radius,
                    kind: e.kind,
                    armed: !arena.powerups.in_spawn_grace(e.id, now),
                })
                .collect(),
        }
    }
}
