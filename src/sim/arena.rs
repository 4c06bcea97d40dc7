//! Match state container
//!
//! `Arena` owns everything a match needs: both players, the projectile
//! registry, the two circular fields, the turn coordinator and the score.
//! Input handlers live here; the per-tick pipeline is in `tick.rs`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::field::{FieldRules, PlacementBand};
use super::player::Player;
use super::projectile::{Projectile, ProjectileId, ProjectileRules, ProjectileSet};
use super::snapshot::RenderSnapshot;
use super::state::{GameEvent, MapTheme, MatchPhase, ObstacleField, PowerupField, Score, Side};
use super::turn::TurnCoordinator;
use crate::error::SettingsError;
use crate::settings::MatchSettings;

/// Complete match state
#[derive(Debug, Clone)]
pub struct Arena {
    pub settings: MatchSettings,
    /// Ticks since the last reset
    pub now: u64,
    pub phase: MatchPhase,
    pub theme: MapTheme,
    /// Indexed by `Side::index`
    pub players: [Player; 2],
    pub projectiles: ProjectileSet,
    /// Each side's top-level shot for the current round, if still flying
    pub shots: [Option<ProjectileId>; 2],
    pub obstacles: ObstacleField,
    pub powerups: PowerupField,
    pub turns: TurnCoordinator,
    pub score: Score,

    pub(crate) rules: ProjectileRules,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) snapshot: RenderSnapshot,
    seed: u64,
}

fn field_rules(settings: &MatchSettings, count: usize, radius: f32, regen: u64, grace: u64, margin: f32) -> FieldRules {
    FieldRules {
        target_count: count,
        radius,
        regen_delay: regen,
        spawn_grace: grace,
        padding: settings.placement_padding,
        max_attempts: settings.placement_attempts,
        band: PlacementBand::mid_screen(settings.arena_width, settings.arena_height, margin, radius),
    }
}

impl Arena {
    /// Build and reset a match. Settings are trusted as given; use
    /// [`Arena::try_new`] for anything read from disk.
    pub fn new(settings: MatchSettings) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let theme = MapTheme::roll(&mut rng);
        let players = [
            Player::new(Side::Left, &settings),
            Player::new(Side::Right, &settings),
        ];

        let obstacles = ObstacleField::new(
            "obstacle",
            field_rules(
                &settings,
                settings.obstacle_count,
                settings.obstacle_radius,
                settings.obstacle_regen_ticks,
                0,
                settings.obstacle_band_margin,
            ),
        );
        let powerups = PowerupField::new(
            "powerup",
            field_rules(
                &settings,
                settings.powerup_count,
                settings.powerup_radius,
                settings.powerup_regen_ticks,
                settings.powerup_spawn_grace_ticks,
                settings.powerup_band_margin,
            ),
        );

        let snapshot = RenderSnapshot::blank(&players, theme);
        let mut arena = Self {
            rules: ProjectileRules::from_settings(&settings),
            turns: TurnCoordinator::new(settings.reload_cooldown_ticks),
            settings,
            now: 0,
            phase: MatchPhase::Playing,
            theme,
            players,
            projectiles: ProjectileSet::new(),
            shots: [None, None],
            obstacles,
            powerups,
            score: Score::default(),
            rng,
            events: Vec::new(),
            snapshot,
            seed,
        };
        arena.reset();
        arena
    }

    /// Validate `settings` first
    pub fn try_new(settings: MatchSettings) -> Result<Self, SettingsError> {
        if let Err(e) = settings.validate() {
            log::warn!("Rejected settings: {}", e);
            return Err(e);
        }
        Ok(Self::new(settings))
    }

    /// Start a fresh match: score, players, projectiles, turns and both
    /// fields. The rng keeps running, so successive matches differ.
    pub fn reset(&mut self) {
        self.clear_projectiles();
        self.now = 0;
        self.phase = MatchPhase::Playing;
        self.score = Score::default();
        self.players = [
            Player::new(Side::Left, &self.settings),
            Player::new(Side::Right, &self.settings),
        ];
        self.turns.reset();
        self.theme = MapTheme::roll(&mut self.rng);

        let obstacles = self.obstacles.populate(0, &mut self.rng, &[]);
        let avoid = self.obstacles.circles();
        let powerups = self.powerups.populate(0, &mut self.rng, &avoid);

        self.events.clear();
        self.refresh_snapshot();

        log::info!(
            "Match reset (seed {}): {:?} map, {} obstacles, {} powerups",
            self.seed,
            self.theme,
            obstacles,
            powerups
        );
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn player(&self, side: Side) -> &Player {
        &self.players[side.index()]
    }

    pub fn player_mut(&mut self, side: Side) -> &mut Player {
        &mut self.players[side.index()]
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, MatchPhase::Over { .. })
    }

    pub fn winner(&self) -> Option<Side> {
        match self.phase {
            MatchPhase::Over { winner } => Some(winner),
            _ => None,
        }
    }

    /// Snapshot built at the end of the last tick
    pub fn renderable_state(&self) -> &RenderSnapshot {
        &self.snapshot
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Fire button pressed
    ///
    /// Armed: spawn a projectile in front of the player and plant them for
    /// the fire pause. Unarmed: reverse the patrol direction instead. Held
    /// repeats are ignored until [`Arena::handle_fire_released`].
    pub fn handle_fire(&mut self, side: Side) {
        if self.phase != MatchPhase::Playing {
            log::trace!("{:?} fire ignored while {:?}", side, self.phase);
            return;
        }

        let idx = side.index();
        let player = &mut self.players[idx];
        if player.trigger_held {
            log::trace!("{:?} fire ignored, trigger still held", side);
            return;
        }
        player.trigger_held = true;

        if !player.has_gun {
            player.reverse_direction();
            self.events.push(GameEvent::Dodged { side });
            log::trace!("{:?} dodged, now heading {}", side, player.direction);
            return;
        }

        if self.shots[idx].is_some() || !self.turns.can_fire(side) {
            log::trace!("{:?} fire rejected in {:?}", side, self.turns.state());
            return;
        }

        let pos = player.muzzle(self.rules.size);
        let id = self.projectiles.allocate_id();
        let projectile = Projectile::new(id, side, None, pos, Vec2::new(side.forward(), 0.0), &self.rules);
        self.projectiles.insert(projectile);
        self.shots[idx] = Some(id);

        player.shoot(self.now, self.settings.fire_pause_ticks);
        self.turns.record_fire(side, self.now);
        self.events.push(GameEvent::Fired { side, projectile: id });
        log::debug!("{:?} fired projectile {} at tick {}", side, id, self.now);
    }

    /// Fire button released; the next press counts again
    pub fn handle_fire_released(&mut self, side: Side) {
        self.players[side.index()].trigger_held = false;
    }

    /// Switch between playing and paused; no effect once the match is over
    pub fn toggle_pause(&mut self) {
        let paused = match self.phase {
            MatchPhase::Playing => true,
            MatchPhase::Paused => false,
            MatchPhase::Over { .. } => return,
        };
        self.phase = if paused { MatchPhase::Paused } else { MatchPhase::Playing };
        self.events.push(GameEvent::Paused { paused });
        self.refresh_snapshot();
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
    }

    /// Remove one projectile and release anything pointing at it
    pub fn remove_projectile(&mut self, id: ProjectileId) -> Option<Projectile> {
        let removed = self.projectiles.remove(id)?;
        self.release(&removed);
        Some(removed)
    }

    /// Remove every live projectile
    pub fn clear_projectiles(&mut self) {
        for projectile in self.projectiles.drain() {
            self.release(&projectile);
        }
    }

    fn release(&mut self, projectile: &Projectile) {
        if let Some(target) = projectile.freeze_target {
            let player = &mut self.players[target.index()];
            if player.marked_by == Some(projectile.id) {
                player.marked_by = None;
            }
        }
        for slot in &mut self.shots {
            if *slot == Some(projectile.id) {
                *slot = None;
            }
        }
    }

    pub(crate) fn refresh_snapshot(&mut self) {
        self.snapshot = RenderSnapshot::capture(self);
    }
}
