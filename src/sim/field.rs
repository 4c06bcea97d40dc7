//! Circular entity fields with rejection-sampled placement
//!
//! Obstacles and powerups share one lifecycle: they are scattered across a
//! mid-screen band without crowding each other, get consumed (broken or
//! picked up), wait out a regeneration delay, and are then replaced if the
//! field is below its target count. A field never loops forever looking for
//! room: each placement gets a fixed attempt budget and gives up quietly.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{Circle, segment_intersects_circle};

/// What a field holds at each live spot; rolled fresh on every placement
pub trait FieldKind: Copy + std::fmt::Debug {
    fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

/// Rectangle of allowed centres for new entries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementBand {
    pub min: Vec2,
    pub max: Vec2,
}

impl PlacementBand {
    /// Middle half of the arena horizontally, with `margin_ratio` of the
    /// height kept clear above and below. Entries of `radius` stay fully
    /// inside the band.
    pub fn mid_screen(width: f32, height: f32, margin_ratio: f32, radius: f32) -> Self {
        let margin = height * margin_ratio;
        Self {
            min: Vec2::new(width / 4.0 + radius, margin + radius),
            max: Vec2::new(width * 3.0 / 4.0 - radius, height - margin - radius),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Uniform candidate centre, or `None` if the band has no area
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2> {
        if !(self.min.x < self.max.x && self.min.y < self.max.y) {
            return None;
        }
        Some(Vec2::new(
            rng.random_range(self.min.x..self.max.x),
            rng.random_range(self.min.y..self.max.y),
        ))
    }
}

/// Static rules of one field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRules {
    pub target_count: usize,
    pub radius: f32,
    /// Ticks a consumed entry waits before a replacement may be placed
    pub regen_delay: u64,
    /// Ticks after spawning during which an entry cannot be activated
    pub spawn_grace: u64,
    /// Extra clearance between neighbouring footprints
    pub padding: f32,
    pub max_attempts: u32,
    pub band: PlacementBand,
}

/// A live entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry<T> {
    pub id: u32,
    pub circle: Circle,
    pub kind: T,
    pub spawned_at: u64,
}

/// A broken/picked-up entry waiting out its regeneration delay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consumed<T> {
    pub entry: FieldEntry<T>,
    pub consumed_at: u64,
}

/// Registry of circular entries of one kind
#[derive(Debug, Clone)]
pub struct SpatialField<T> {
    pub rules: FieldRules,
    /// Name used in log lines
    label: &'static str,
    /// Live entries (sorted by id)
    live: Vec<FieldEntry<T>>,
    pending: Vec<Consumed<T>>,
    next_id: u32,
}

impl<T: FieldKind> SpatialField<T> {
    pub fn new(label: &'static str, rules: FieldRules) -> Self {
        Self {
            rules,
            label,
            live: Vec::with_capacity(rules.target_count),
            pending: Vec::new(),
            next_id: 1,
        }
    }

    pub fn live(&self) -> &[FieldEntry<T>] {
        &self.live
    }

    pub fn pending(&self) -> &[Consumed<T>] {
        &self.pending
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn get(&self, id: u32) -> Option<&FieldEntry<T>> {
        self.live.iter().find(|e| e.id == id)
    }

    /// Footprints of all live entries
    pub fn circles(&self) -> Vec<Circle> {
        self.live.iter().map(|e| e.circle).collect()
    }

    /// Drop every live and pending entry
    pub fn clear(&mut self) {
        self.live.clear();
        self.pending.clear();
    }

    /// Put an entry at an exact spot, skipping the overlap rules
    pub fn insert(&mut self, center: Vec2, kind: T, now: u64) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.push(FieldEntry {
            id,
            circle: Circle::new(center, self.rules.radius),
            kind,
            spawned_at: now,
        });
        id
    }

    /// Clear the field and scatter up to `target_count` fresh entries
    ///
    /// Returns how many were placed; fewer than the target means the
    /// sampler ran out of attempts.
    pub fn populate<R: Rng + ?Sized>(&mut self, now: u64, rng: &mut R, avoid: &[Circle]) -> usize {
        self.clear();
        let mut placed = 0;
        for _ in 0..self.rules.target_count {
            if self.try_place(now, rng, avoid).is_some() {
                placed += 1;
            }
        }
        log::debug!(
            "{} field populated: {}/{}",
            self.label,
            placed,
            self.rules.target_count
        );
        placed
    }

    /// Rejection-sample one new entry that crowds neither this field's live
    /// entries nor anything in `avoid`
    pub fn try_place<R: Rng + ?Sized>(&mut self, now: u64, rng: &mut R, avoid: &[Circle]) -> Option<u32> {
        let radius = self.rules.radius;
        let padding = self.rules.padding;

        for _ in 0..self.rules.max_attempts {
            let center = self.rules.band.sample(rng)?;
            let candidate = Circle::new(center, radius);

            let crowded = self.live.iter().any(|e| candidate.crowds(&e.circle, padding))
                || avoid.iter().any(|c| candidate.crowds(c, padding));
            if crowded {
                continue;
            }

            let kind = T::roll(rng);
            let id = self.insert(center, kind, now);
            log::debug!(
                "{} {} placed at ({:.0}, {:.0}) as {:?}",
                self.label,
                id,
                center.x,
                center.y,
                kind
            );
            return Some(id);
        }

        log::warn!(
            "{} placement gave up after {} attempts ({} live)",
            self.label,
            self.rules.max_attempts,
            self.live.len()
        );
        None
    }

    /// Remove a live entry and start its regeneration timer
    pub fn consume(&mut self, id: u32, now: u64) -> Option<T> {
        let idx = self.live.iter().position(|e| e.id == id)?;
        let entry = self.live.remove(idx);
        self.pending.push(Consumed {
            entry,
            consumed_at: now,
        });
        Some(entry.kind)
    }

    /// True while a live entry is inside its post-spawn grace window
    pub fn in_spawn_grace(&self, id: u32, now: u64) -> bool {
        self.get(id)
            .is_some_and(|e| now.saturating_sub(e.spawned_at) < self.rules.spawn_grace)
    }

    /// Consume an entry unless it is still in its spawn grace window
    pub fn try_activate(&mut self, id: u32, now: u64) -> Option<T> {
        if self.in_spawn_grace(id, now) {
            log::trace!("{} {} still in spawn grace", self.label, id);
            return None;
        }
        self.consume(id, now)
    }

    /// Live entry past its spawn grace whose footprint, grown by
    /// `extra_radius`, touches the swept segment `start..end`. When several
    /// do, the one closest to `start` wins (ties go to the lower id).
    pub fn first_swept_hit(&self, start: Vec2, end: Vec2, extra_radius: f32, now: u64) -> Option<u32> {
        let grace = self.rules.spawn_grace;
        self.live
            .iter()
            .filter(|e| now.saturating_sub(e.spawned_at) >= grace)
            .filter(|e| segment_intersects_circle(e.circle.center, e.circle.radius + extra_radius, start, end))
            .min_by(|a, b| {
                a.circle
                    .center
                    .distance_squared(start)
                    .partial_cmp(&b.circle.center.distance_squared(start))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.id)
    }

    /// Expire pending entries and place replacements
    ///
    /// Each expired entry allows one placement attempt, only while the field
    /// is below target. If nothing expired but live plus pending still falls
    /// short of the target (an earlier placement gave up), one top-up attempt
    /// is made. Returns the ids placed.
    pub fn update<R: Rng + ?Sized>(&mut self, now: u64, rng: &mut R, avoid: &[Circle]) -> Vec<u32> {
        let regen_delay = self.rules.regen_delay;
        let before = self.pending.len();
        self.pending
            .retain(|c| now.saturating_sub(c.consumed_at) < regen_delay);
        let expired = before - self.pending.len();

        let mut placed = Vec::new();
        for _ in 0..expired {
            if self.live.len() < self.rules.target_count {
                placed.extend(self.try_place(now, rng, avoid));
            }
        }

        if expired == 0 && self.live.len() + self.pending.len() < self.rules.target_count {
            placed.extend(self.try_place(now, rng, avoid));
        }

        if !placed.is_empty() {
            log::debug!("{} regenerated {:?}", self.label, placed);
        }
        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Marker;

    impl FieldKind for Marker {
        fn roll<R: Rng + ?Sized>(_rng: &mut R) -> Self {
            Marker
        }
    }

    fn rules(target_count: usize) -> FieldRules {
        FieldRules {
            target_count,
            radius: 30.0,
            regen_delay: 100,
            spawn_grace: 10,
            padding: 10.0,
            max_attempts: 20,
            band: PlacementBand::mid_screen(1000.0, 600.0, 0.1, 30.0),
        }
    }

    fn assert_spread(circles: &[Circle], padding: f32) {
        for (i, a) in circles.iter().enumerate() {
            for b in &circles[i + 1..] {
                let min = a.radius + b.radius + padding;
                assert!(
                    a.center.distance(b.center) >= min - 1e-3,
                    "{:?} too close to {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_populate_respects_band_and_spacing() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut field = SpatialField::<Marker>::new("test", rules(5));
        let placed = field.populate(0, &mut rng, &[]);
        assert!(placed <= 5);
        assert_eq!(field.live_count(), placed);
        for e in field.live() {
            assert!(field.rules.band.contains(e.circle.center));
        }
        assert_spread(&field.circles(), 10.0);
    }

    #[test]
    fn test_empty_band_gives_up_without_panicking() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut r = rules(3);
        // Radius wider than the band: no valid centre exists
        r.band = PlacementBand::mid_screen(100.0, 100.0, 0.1, 60.0);
        let mut field = SpatialField::<Marker>::new("test", r);
        assert_eq!(field.populate(0, &mut rng, &[]), 0);
        assert!(field.update(1, &mut rng, &[]).is_empty());
    }

    #[test]
    fn test_crowded_band_stops_after_budget() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut field = SpatialField::<Marker>::new("test", rules(1));
        // Blanket the band with one huge avoid circle
        let avoid = [Circle::new(Vec2::new(500.0, 300.0), 2000.0)];
        assert!(field.try_place(0, &mut rng, &avoid).is_none());
        assert_eq!(field.live_count(), 0);
    }

    #[test]
    fn test_consume_then_regenerate_after_delay() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut field = SpatialField::<Marker>::new("test", rules(1));
        let id = field.insert(Vec2::new(400.0, 300.0), Marker, 0);

        assert_eq!(field.consume(id, 50), Some(Marker));
        assert_eq!(field.live_count(), 0);
        assert!(field
            .first_swept_hit(Vec2::new(300.0, 300.0), Vec2::new(500.0, 300.0), 0.0, 50)
            .is_none());

        // Not yet
        assert!(field.update(149, &mut rng, &[]).is_empty());
        assert_eq!(field.pending().len(), 1);

        let placed = field.update(150, &mut rng, &[]);
        assert_eq!(placed.len(), 1);
        assert!(field.pending().is_empty());
        assert_eq!(field.live_count(), 1);
    }

    #[test]
    fn test_no_regeneration_when_at_target() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut field = SpatialField::<Marker>::new("test", rules(1));
        let id = field.insert(Vec2::new(400.0, 300.0), Marker, 0);
        field.consume(id, 0);
        // Someone refilled the field in the meantime
        field.insert(Vec2::new(600.0, 200.0), Marker, 10);

        assert!(field.update(100, &mut rng, &[]).is_empty());
        assert!(field.pending().is_empty());
        assert_eq!(field.live_count(), 1);
    }

    #[test]
    fn test_top_up_after_exhaustion() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut field = SpatialField::<Marker>::new("test", rules(1));
        // Nothing live, nothing pending: the next update tries to fill the gap
        let placed = field.update(0, &mut rng, &[]);
        assert_eq!(placed.len(), 1);
        assert_eq!(field.live_count(), 1);
    }

    #[test]
    fn test_spawn_grace_blocks_activation() {
        let mut field = SpatialField::<Marker>::new("test", rules(1));
        let id = field.insert(Vec2::new(400.0, 300.0), Marker, 100);
        assert!(field.in_spawn_grace(id, 105));
        assert_eq!(field.try_activate(id, 109), None);
        assert_eq!(field.live_count(), 1);
        assert_eq!(field.try_activate(id, 110), Some(Marker));
        assert_eq!(field.live_count(), 0);
    }

    #[test]
    fn test_first_swept_hit_picks_nearest_to_start() {
        let mut field = SpatialField::<Marker>::new("test", rules(2));
        let far = field.insert(Vec2::new(600.0, 300.0), Marker, 0);
        let near = field.insert(Vec2::new(400.0, 300.0), Marker, 0);
        let hit = field.first_swept_hit(Vec2::new(300.0, 300.0), Vec2::new(700.0, 300.0), 5.0, 100);
        assert_eq!(hit, Some(near));

        // Travelling the other way meets the other one first
        let hit = field.first_swept_hit(Vec2::new(700.0, 300.0), Vec2::new(300.0, 300.0), 5.0, 100);
        assert_eq!(hit, Some(far));

        // Off to the side: nothing
        assert!(field
            .first_swept_hit(Vec2::new(300.0, 100.0), Vec2::new(700.0, 100.0), 5.0, 100)
            .is_none());
    }

    #[test]
    fn test_first_swept_hit_skips_entries_in_grace() {
        let mut field = SpatialField::<Marker>::new("test", rules(2));
        let fresh = field.insert(Vec2::new(400.0, 300.0), Marker, 95);
        let armed = field.insert(Vec2::new(600.0, 300.0), Marker, 0);
        let from = Vec2::new(300.0, 300.0);
        let to = Vec2::new(700.0, 300.0);

        // The nearer one is still fresh, so the armed one further on is hit
        assert_eq!(field.first_swept_hit(from, to, 5.0, 100), Some(armed));
        assert_eq!(field.first_swept_hit(from, to, 5.0, 105), Some(fresh));

        // Nothing armed along the path
        field.consume(armed, 100);
        assert!(field.first_swept_hit(from, to, 5.0, 100).is_none());
    }

    proptest! {
        #[test]
        fn prop_placement_never_crowds(seed in any::<u64>(), count in 1usize..8) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let obstacles = {
                let mut f = SpatialField::<Marker>::new("obstacle", rules(count));
                f.populate(0, &mut rng, &[]);
                f.circles()
            };
            let mut r = rules(count);
            r.radius = 22.0;
            let mut powerups = SpatialField::<Marker>::new("powerup", r);
            powerups.populate(0, &mut rng, &obstacles);

            let mut all = obstacles.clone();
            all.extend(powerups.circles());
            for (i, a) in all.iter().enumerate() {
                for b in &all[i + 1..] {
                    prop_assert!(a.center.distance(b.center) >= a.radius + b.radius + 10.0 - 1e-3);
                }
            }
        }
    }
}
