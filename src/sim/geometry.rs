//! Collision geometry
//!
//! Plain value types and free functions. Entities embed a [`Rect`] instead of
//! extending one, and every projectile test against a circle goes through
//! [`segment_intersects_circle`] on the swept path so nothing tunnels through
//! a target in a single tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Segments shorter than this (squared) are treated as points
const DEGENERATE_SEGMENT_SQ: f32 = 1e-6;

/// Axis-aligned box, `pos` is the top-left corner (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Box of the given size centred on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            pos: center - size * 0.5,
            size,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    /// Overlap test; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Scale width and height about the centre
    pub fn scale_about_center(&mut self, factor: f32) {
        let center = self.center();
        self.size *= factor;
        self.pos = center - self.size * 0.5;
    }
}

/// A circular footprint (obstacles, powerups)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// True if the two circles are closer than their radii plus `padding`
    pub fn crowds(&self, other: &Circle, padding: f32) -> bool {
        let min_dist = self.radius + other.radius + padding;
        self.center.distance_squared(other.center) < min_dist * min_dist
    }
}

/// Euclidean distance from `center` to `point` is at most `radius`
#[inline]
pub fn point_in_circle(center: Vec2, radius: f32, point: Vec2) -> bool {
    center.distance_squared(point) <= radius * radius
}

/// Does the segment `seg_start..seg_end` pass within `radius` of `center`?
///
/// Projects the centre onto the segment, clamps the parameter to [0, 1] and
/// compares the squared distance to the closest point. A zero-length segment
/// degrades to [`point_in_circle`].
pub fn segment_intersects_circle(center: Vec2, radius: f32, seg_start: Vec2, seg_end: Vec2) -> bool {
    let seg = seg_end - seg_start;
    let len_sq = seg.length_squared();
    if len_sq < DEGENERATE_SEGMENT_SQ {
        return point_in_circle(center, radius, seg_start);
    }

    let t = ((center - seg_start).dot(seg) / len_sq).clamp(0.0, 1.0);
    let closest = seg_start + seg * t;
    center.distance_squared(closest) <= radius * radius
}
