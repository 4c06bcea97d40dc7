//! Player patrol and status timers
//!
//! Players only ever move vertically, bouncing between the top margin and
//! the floor. Every status is a tick deadline: active while `now < until`,
//! cleared the first tick it lapses.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::projectile::ProjectileId;
use super::state::Side;
use crate::settings::MatchSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub side: Side,
    pub rect: Rect,
    /// +1 moving down, -1 moving up
    pub direction: f32,
    /// Pixels per tick
    pub speed: f32,
    pub has_gun: bool,
    /// Movement pause after firing
    pub fire_paused_until: Option<u64>,
    pub frozen_until: Option<u64>,
    pub invincible_until: Option<u64>,
    /// Freeze-carrying projectile currently homing on this player
    pub marked_by: Option<ProjectileId>,
    /// Fire button is down; repeats are ignored until it is released
    pub trigger_held: bool,
    top_limit: f32,
    bottom_limit: f32,
}

impl Player {
    pub fn new(side: Side, settings: &MatchSettings) -> Self {
        let x = match side {
            Side::Left => settings.player_inset,
            Side::Right => settings.arena_width - settings.player_inset - settings.player_width,
        };
        let top_limit = settings.top_margin();
        let bottom_limit = settings.arena_height - settings.player_height;
        let y = (settings.arena_height / 2.0).max(top_limit).min(bottom_limit);

        Self {
            side,
            rect: Rect::new(x, y, settings.player_width, settings.player_height),
            direction: 1.0,
            speed: settings.player_speed,
            has_gun: true,
            fire_paused_until: None,
            frozen_until: None,
            invincible_until: None,
            marked_by: None,
            trigger_held: false,
            top_limit,
            bottom_limit,
        }
    }

    /// Signed vertical velocity the patrol is heading with
    #[inline]
    pub fn velocity(&self) -> f32 {
        self.direction * self.speed
    }

    pub fn is_frozen(&self, now: u64) -> bool {
        self.frozen_until.is_some_and(|until| now < until)
    }

    pub fn is_invincible(&self, now: u64) -> bool {
        self.invincible_until.is_some_and(|until| now < until)
    }

    pub fn is_fire_paused(&self, now: u64) -> bool {
        self.fire_paused_until.is_some_and(|until| now < until)
    }

    /// Drop any status whose deadline has passed
    pub fn expire_timers(&mut self, now: u64) {
        for timer in [
            &mut self.fire_paused_until,
            &mut self.frozen_until,
            &mut self.invincible_until,
        ] {
            if timer.is_some_and(|until| now >= until) {
                *timer = None;
            }
        }
    }

    /// One tick of patrol; a frozen or fire-paused player stays put
    pub fn advance(&mut self, now: u64) {
        self.expire_timers(now);
        if self.is_frozen(now) || self.is_fire_paused(now) {
            return;
        }

        self.rect.pos.y += self.velocity();

        if self.rect.pos.y < self.top_limit {
            self.rect.pos.y = self.top_limit;
            self.direction = 1.0;
        } else if self.rect.pos.y > self.bottom_limit {
            self.rect.pos.y = self.bottom_limit;
            self.direction = -1.0;
        }
    }

    pub fn reverse_direction(&mut self) {
        self.direction = -self.direction;
    }

    /// Give up the gun and plant for `pause_ticks`
    pub fn shoot(&mut self, now: u64, pause_ticks: u64) {
        self.has_gun = false;
        self.fire_paused_until = Some(now.saturating_add(pause_ticks));
    }

    /// Start (or restart) a freeze; returns the tick it lapses
    pub fn freeze(&mut self, now: u64, ticks: u64) -> u64 {
        let until = now.saturating_add(ticks);
        self.frozen_until = Some(until);
        until
    }

    pub fn make_invincible(&mut self, now: u64, ticks: u64) {
        self.invincible_until = Some(now.saturating_add(ticks));
    }

    /// Top-left corner for a new projectile of `size`, just in front of the
    /// player and level with its centre
    pub fn muzzle(&self, size: Vec2) -> Vec2 {
        let y = self.rect.center().y - size.y / 2.0;
        match self.side {
            Side::Left => Vec2::new(self.rect.right(), y),
            Side::Right => Vec2::new(self.rect.left() - size.x, y),
        }
    }
}
