//! Duel Arena - a two-player ricochet duel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, collisions, turns, scoring)
//! - `settings`: Data-driven match tuning loaded from JSON
//! - `audio`: Fire-and-forget audio cue seam
//! - `renderer`: Render seam fed by per-tick snapshots
//! - `platform`: Input sources

pub mod audio;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::SettingsError;
pub use settings::MatchSettings;

use glam::Vec2;

/// Match configuration defaults
///
/// Durations are in simulation ticks. `ms_to_ticks` documents the
/// millisecond figure each one was derived from.
pub mod consts {
    /// Fixed simulation rate
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 1000.0;
    pub const ARENA_HEIGHT: f32 = 600.0;
    /// Fraction of the arena height reserved at the top (score strip)
    pub const TOP_MARGIN_RATIO: f32 = 0.1;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 25.0;
    pub const PLAYER_HEIGHT: f32 = 100.0;
    pub const PLAYER_INSET: f32 = 50.0;
    pub const PLAYER_SPEED: f32 = 5.0;

    /// Projectile defaults
    pub const PROJECTILE_WIDTH: f32 = 20.0;
    pub const PROJECTILE_HEIGHT: f32 = 10.0;
    pub const PROJECTILE_SPEED: f32 = 10.0;
    /// Smallest allowed |dx| of a unit heading
    pub const MIN_HORIZONTAL_RATIO: f32 = 0.2;
    /// Smallest allowed |x| of an obstacle bounce normal
    pub const BOUNCE_HORIZONTAL_CLAMP: f32 = 0.1;
    pub const BIG_BULLET_MULTIPLIER: f32 = 2.0;
    /// Split children leave at +/- this angle (degrees) from the parent heading
    pub const SPLIT_ANGLE_DEGREES: f32 = 30.0;

    /// Status timers
    pub const FIRE_PAUSE_TICKS: u64 = 15; // 250 ms
    pub const FREEZE_TICKS: u64 = 120; // 2 s
    pub const INVINCIBLE_TICKS: u64 = 60; // 1 s
    pub const RELOAD_COOLDOWN_TICKS: u64 = 30; // 500 ms

    /// Obstacle field
    pub const OBSTACLE_COUNT: usize = 5;
    pub const OBSTACLE_RADIUS: f32 = 30.0;
    pub const OBSTACLE_REGEN_TICKS: u64 = 300; // 5 s
    pub const OBSTACLE_BAND_MARGIN: f32 = 0.1;

    /// Powerup field
    pub const POWERUP_COUNT: usize = 3;
    pub const POWERUP_RADIUS: f32 = 22.0;
    pub const POWERUP_REGEN_TICKS: u64 = 420; // 7 s
    pub const POWERUP_SPAWN_GRACE_TICKS: u64 = 30; // 500 ms
    pub const POWERUP_BAND_MARGIN: f32 = 0.12;

    /// Rejection sampling
    pub const PLACEMENT_PADDING: f32 = 10.0;
    pub const PLACEMENT_ATTEMPTS: u32 = 20;

    /// First side to reach this score wins
    pub const WIN_SCORE: u32 = 10;

    /// Convert a millisecond duration to whole ticks (rounded up)
    pub const fn ms_to_ticks(ms: u64) -> u64 {
        (ms * TICKS_PER_SECOND as u64).div_ceil(1000)
    }
}

/// Heading of a vector in radians, `atan2(y, x)`
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Unit vector for a heading in radians
#[inline]
pub fn from_heading(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
