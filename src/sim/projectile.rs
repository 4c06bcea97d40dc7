//! Projectile physics
//!
//! Projectiles fly at constant speed, reflect off the top margin and the
//! floor, and ricochet off obstacles along the centre-to-centre normal.
//! Every heading passes through [`constrain_direction`], which keeps a
//! minimum horizontal component so nothing can bounce vertically forever.
//!
//! Split children live in the same flat [`ProjectileSet`] as their parent
//! and point back at it by id.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::state::Side;
use crate::settings::MatchSettings;
use crate::{from_heading, heading};

pub type ProjectileId = u32;

/// Motion constants shared by every projectile in a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileRules {
    pub size: Vec2,
    pub speed: f32,
    pub min_horizontal_ratio: f32,
    pub bounce_horizontal_clamp: f32,
    pub big_bullet_multiplier: f32,
    /// Radians either side of the parent heading
    pub split_angle: f32,
    /// Vertical bounce limits
    pub top: f32,
    pub bottom: f32,
    pub arena_width: f32,
}

impl ProjectileRules {
    pub fn from_settings(settings: &MatchSettings) -> Self {
        Self {
            size: Vec2::new(settings.projectile_width, settings.projectile_height),
            speed: settings.projectile_speed,
            min_horizontal_ratio: settings.min_horizontal_ratio,
            bounce_horizontal_clamp: settings.bounce_horizontal_clamp,
            big_bullet_multiplier: settings.big_bullet_multiplier,
            split_angle: settings.split_angle_degrees.to_radians(),
            top: settings.top_margin(),
            bottom: settings.arena_height,
            arena_width: settings.arena_width,
        }
    }
}

/// Sign of `v`, or `fallback` when `v` is exactly zero
#[inline]
fn sign_or(v: f32, fallback: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        fallback.signum()
    }
}

/// Normalise `dir` and lift its horizontal component to at least
/// `min_ratio`, keeping the vertical sign and unit length
///
/// A zero (or non-finite) input becomes straight along `forward`.
pub fn constrain_direction(dir: Vec2, forward: f32, min_ratio: f32) -> Vec2 {
    let mut d = dir.normalize_or_zero();
    if d == Vec2::ZERO {
        return Vec2::new(sign_or(forward, 1.0), 0.0);
    }

    if d.x.abs() < min_ratio {
        let x_sign = sign_or(d.x, forward);
        let y_sign = if d.y < 0.0 { -1.0 } else { 1.0 };
        d.x = min_ratio * x_sign;
        d.y = y_sign * (1.0 - min_ratio * min_ratio).max(0.0).sqrt();
    }
    d
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner: Side,
    /// Set on split children
    pub parent: Option<ProjectileId>,
    pub rect: Rect,
    /// Centre at the start of the current tick (swept collision start)
    pub prev_center: Vec2,
    pub vel: Vec2,
    /// Radians, `atan2(vy, vx)`
    pub rotation: f32,
    /// Footprint multiplier, >= 1
    pub scale: f32,
    /// Player this projectile freezes on contact
    pub freeze_target: Option<Side>,
    /// A projectile splits at most once
    pub has_split: bool,
}

impl Projectile {
    /// A fresh projectile at `pos` heading along `dir`
    pub fn new(
        id: ProjectileId,
        owner: Side,
        parent: Option<ProjectileId>,
        pos: Vec2,
        dir: Vec2,
        rules: &ProjectileRules,
    ) -> Self {
        let rect = Rect {
            pos,
            size: rules.size,
        };
        let mut projectile = Self {
            id,
            owner,
            parent,
            rect,
            prev_center: rect.center(),
            vel: Vec2::ZERO,
            rotation: 0.0,
            scale: 1.0,
            freeze_target: None,
            has_split: false,
        };
        projectile.set_direction(dir, rules);
        projectile
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Radius used against circular targets
    #[inline]
    pub fn collision_radius(&self) -> f32 {
        self.rect.size.min_element() * 0.5
    }

    /// Point the projectile along `dir` at base speed
    pub fn set_direction(&mut self, dir: Vec2, rules: &ProjectileRules) {
        let d = constrain_direction(dir, self.owner.forward(), rules.min_horizontal_ratio);
        self.vel = d * rules.speed;
        self.rotation = heading(self.vel);
    }

    /// Integrate one tick and reflect off the vertical bounds
    pub fn advance(&mut self, rules: &ProjectileRules) {
        self.prev_center = self.center();
        self.rect.pos += self.vel;

        if self.rect.top() < rules.top {
            self.rect.pos.y = rules.top;
            self.vel.y = self.vel.y.abs();
        } else if self.rect.bottom() > rules.bottom {
            self.rect.pos.y = rules.bottom - self.rect.size.y;
            self.vel.y = -self.vel.y.abs();
        }

        self.rotation = heading(self.vel);
    }

    /// Ricochet away from an obstacle centred at `obstacle_center`
    pub fn bounce_off(&mut self, obstacle_center: Vec2, rules: &ProjectileRules) {
        let mut normal = (self.center() - obstacle_center).normalize_or_zero();
        let clamp = rules.bounce_horizontal_clamp;
        if normal.x.abs() < clamp {
            // Dead-centre hits send the projectile back the way it came
            normal.x = clamp * sign_or(normal.x, -self.vel.x);
        }
        self.set_direction(normal, rules);
    }

    /// Grow the footprint (BigBullet)
    pub fn enlarge(&mut self, rules: &ProjectileRules) {
        let factor = rules.big_bullet_multiplier;
        self.rect.scale_about_center(factor);
        self.scale *= factor;
    }

    /// Mark for freeze delivery and turn toward the target's centre
    pub fn arm_freeze(&mut self, target: Side, target_center: Vec2, rules: &ProjectileRules) {
        self.freeze_target = Some(target);
        self.set_direction(target_center - self.center(), rules);
    }

    /// Two children at +/- the split angle from the current heading, starting
    /// from this projectile's centre. `None` if this one already split.
    pub fn split(&mut self, ids: [ProjectileId; 2], rules: &ProjectileRules) -> Option<[Projectile; 2]> {
        if self.has_split {
            return None;
        }
        self.has_split = true;

        let theta = heading(self.vel);
        let origin = self.center() - rules.size * 0.5;
        let make = |id, angle: f32| {
            Projectile::new(id, self.owner, Some(self.id), origin, from_heading(angle), rules)
        };
        Some([
            make(ids[0], theta - rules.split_angle),
            make(ids[1], theta + rules.split_angle),
        ])
    }

    /// Left the arena through a side edge
    pub fn is_out_of_bounds(&self, arena_width: f32) -> bool {
        self.rect.pos.x < -self.rect.size.x || self.rect.pos.x > arena_width
    }
}

/// Flat registry of live projectiles (sorted by id)
#[derive(Debug, Clone)]
pub struct ProjectileSet {
    items: Vec<Projectile>,
    next_id: ProjectileId,
}

impl Default for ProjectileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectileSet {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    pub fn allocate_id(&mut self) -> ProjectileId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, projectile: Projectile) {
        self.items.push(projectile);
        self.items.sort_by_key(|p| p.id);
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.items.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.items.iter_mut().find(|p| p.id == id)
    }

    pub fn remove(&mut self, id: ProjectileId) -> Option<Projectile> {
        let idx = self.items.iter().position(|p| p.id == id)?;
        Some(self.items.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.items.iter_mut()
    }

    pub fn ids(&self) -> Vec<ProjectileId> {
        self.items.iter().map(|p| p.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Any projectile (parent or descendant) owned by `side` still flying
    pub fn any_owned_by(&self, side: Side) -> bool {
        self.items.iter().any(|p| p.owner == side)
    }

    pub fn children_of(&self, parent: ProjectileId) -> impl Iterator<Item = &Projectile> {
        self.items.iter().filter(move |p| p.parent == Some(parent))
    }

    /// Remove everything, returning what was live
    pub fn drain(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.items)
    }
}
