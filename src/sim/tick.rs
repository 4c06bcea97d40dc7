//! Fixed timestep simulation tick
//!
//! One call advances the match by exactly one tick. Phases run in a fixed
//! order and every loop walks projectiles by ascending id, so the same seed
//! and the same inputs always replay the same match.

use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::projectile::ProjectileId;
use super::state::{GameEvent, MatchPhase, PowerupKind, Side};

/// Discrete input, applied between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    FireDown(Side),
    FireUp(Side),
    TogglePause,
    Reset,
}

impl Arena {
    pub fn apply(&mut self, input: InputEvent) {
        match input {
            InputEvent::FireDown(side) => self.handle_fire(side),
            InputEvent::FireUp(side) => self.handle_fire_released(side),
            InputEvent::TogglePause => self.toggle_pause(),
            InputEvent::Reset => self.reset(),
        }
    }

    /// Advance the match by one fixed timestep
    pub fn tick(&mut self) {
        // Paused and finished matches keep their last snapshot
        if self.phase != MatchPhase::Playing {
            return;
        }

        self.now += 1;
        let now = self.now;

        for player in &mut self.players {
            player.advance(now);
        }

        self.advance_projectiles();
        self.resolve_obstacles();
        self.resolve_powerups();
        self.resolve_player_hits();
        if self.phase != MatchPhase::Playing {
            self.refresh_snapshot();
            return;
        }

        // Each field keeps clear of the other
        let avoid = self.powerups.circles();
        self.obstacles.update(now, &mut self.rng, &avoid);
        let avoid = self.obstacles.circles();
        self.powerups.update(now, &mut self.rng, &avoid);

        if self.turns.update(now, self.projectiles.is_empty()) {
            for player in &mut self.players {
                player.has_gun = true;
            }
            self.events.push(GameEvent::Reloaded);
            log::debug!("Guns reloaded at tick {}", now);
        }

        self.refresh_snapshot();
    }

    fn advance_projectiles(&mut self) {
        let rules = self.rules;
        for projectile in self.projectiles.iter_mut() {
            projectile.advance(&rules);
        }

        let gone: Vec<ProjectileId> = self
            .projectiles
            .iter()
            .filter(|p| p.is_out_of_bounds(rules.arena_width))
            .map(|p| p.id)
            .collect();
        for id in gone {
            self.remove_projectile(id);
            log::trace!("Projectile {} left the arena", id);
        }
    }

    /// Break the first obstacle each projectile swept through and ricochet
    fn resolve_obstacles(&mut self) {
        let now = self.now;
        let rules = self.rules;

        for id in self.projectiles.ids() {
            let Some(p) = self.projectiles.get(id) else {
                continue;
            };
            let Some(obstacle) = self
                .obstacles
                .first_swept_hit(p.prev_center, p.center(), p.collision_radius(), now)
            else {
                continue;
            };
            let Some(center) = self.obstacles.get(obstacle).map(|e| e.circle.center) else {
                continue;
            };

            self.obstacles.consume(obstacle, now);
            if let Some(p) = self.projectiles.get_mut(id) {
                p.bounce_off(center, &rules);
            }
            self.events.push(GameEvent::ObstacleBounce {
                projectile: id,
                obstacle,
            });
            log::trace!("Projectile {} broke obstacle {}", id, obstacle);
        }
    }

    /// Activate the first armed powerup each projectile swept through
    fn resolve_powerups(&mut self) {
        let now = self.now;

        for id in self.projectiles.ids() {
            let Some(p) = self.projectiles.get(id) else {
                continue;
            };
            let owner = p.owner;
            let Some(powerup) = self
                .powerups
                .first_swept_hit(p.prev_center, p.center(), p.collision_radius(), now)
            else {
                continue;
            };
            let Some(kind) = self.powerups.try_activate(powerup, now) else {
                continue;
            };

            self.apply_powerup(id, kind);
            self.events.push(GameEvent::PowerupActivated {
                projectile: id,
                owner,
                kind,
            });
            log::debug!("Projectile {} picked up {:?}", id, kind);
        }
    }

    fn apply_powerup(&mut self, id: ProjectileId, kind: PowerupKind) {
        let rules = self.rules;

        match kind {
            PowerupKind::Bomb => {
                if self.projectiles.get(id).is_none_or(|p| p.has_split) {
                    return;
                }
                let ids = [self.projectiles.allocate_id(), self.projectiles.allocate_id()];
                let children = self.projectiles.get_mut(id).and_then(|p| p.split(ids, &rules));
                for child in children.into_iter().flatten() {
                    self.projectiles.insert(child);
                }
            }
            PowerupKind::Freeze => {
                let Some(owner) = self.projectiles.get(id).map(|p| p.owner) else {
                    return;
                };
                let target = owner.opponent();
                let target_center = self.players[target.index()].rect.center();
                if let Some(p) = self.projectiles.get_mut(id) {
                    p.arm_freeze(target, target_center, &rules);
                }
                self.players[target.index()].marked_by = Some(id);
            }
            PowerupKind::BigBullet => {
                if let Some(p) = self.projectiles.get_mut(id) {
                    p.enlarge(&rules);
                }
            }
        }
    }

    /// Score projectiles that reached the opponent of their owner
    ///
    /// Hits are taken in ascending projectile id order. The first one that
    /// brings its shooter to `win_score` ends the match, and any later hits
    /// in the same tick are not scored.
    fn resolve_player_hits(&mut self) {
        let now = self.now;

        for id in self.projectiles.ids() {
            let Some(p) = self.projectiles.get(id) else {
                continue;
            };
            let shooter = p.owner;
            let target = shooter.opponent();
            let freezes = p.freeze_target == Some(target);

            let player = &self.players[target.index()];
            if !player.rect.intersects(&p.rect) {
                continue;
            }
            if player.is_invincible(now) {
                // Passes straight through
                continue;
            }

            self.remove_projectile(id);
            let points = self.score.award(shooter);

            let invincible_ticks = self.settings.invincible_ticks;
            let freeze_ticks = self.settings.freeze_ticks;
            let player = &mut self.players[target.index()];
            player.make_invincible(now, invincible_ticks);
            if freezes {
                let until = player.freeze(now, freeze_ticks);
                self.events.push(GameEvent::Frozen { side: target, until });
            }

            self.events.push(GameEvent::Hit {
                shooter,
                target,
                score: self.score,
            });
            log::info!(
                "{:?} hit {:?} ({} points), score {}-{}",
                shooter,
                target,
                points,
                self.score.left,
                self.score.right
            );

            if points >= self.settings.win_score {
                self.finish(shooter);
                return;
            }
        }
    }

    fn finish(&mut self, winner: Side) {
        self.phase = MatchPhase::Over { winner };
        self.events.push(GameEvent::MatchOver { winner });
        log::info!(
            "{:?} wins {}-{} at tick {}",
            winner,
            self.score.left,
            self.score.right,
            self.now
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MatchSettings;
    use glam::Vec2;

    fn quiet() -> MatchSettings {
        MatchSettings {
            seed: Some(7),
            obstacle_count: 0,
            powerup_count: 0,
            ..Default::default()
        }
    }

    /// Tick until `done` holds, at most `max` times
    fn run_until(arena: &mut Arena, max: u64, mut done: impl FnMut(&Arena) -> bool) -> bool {
        for _ in 0..max {
            arena.tick();
            if done(arena) {
                return true;
            }
        }
        false
    }

    fn pin(arena: &mut Arena, side: Side) {
        arena.player_mut(side).frozen_until = Some(u64::MAX);
    }

    #[test]
    fn test_projectile_scores_and_grants_invincibility() {
        let mut arena = Arena::new(quiet());
        pin(&mut arena, Side::Right);
        arena.handle_fire(Side::Left);

        assert!(run_until(&mut arena, 200, |a| a.score.left == 1));
        let hit_at = arena.now;
        assert!(arena.projectiles.is_empty());
        assert_eq!(arena.shots[0], None);
        assert_eq!(arena.player(Side::Right).invincible_until, Some(hit_at + 60));
        assert!(arena.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::Hit {
                shooter: Side::Left,
                target: Side::Right,
                ..
            }
        )));

        for _ in 0..50 {
            arena.tick();
        }
        assert_eq!(arena.score.left, 1);
        assert_eq!(arena.score.right, 0);
    }

    #[test]
    fn test_invincible_target_lets_projectile_through() {
        let mut arena = Arena::new(quiet());
        pin(&mut arena, Side::Right);
        arena.player_mut(Side::Right).invincible_until = Some(u64::MAX);
        arena.handle_fire(Side::Left);

        assert!(run_until(&mut arena, 200, |a| a.projectiles.is_empty()));
        assert_eq!(arena.score.left, 0);
        assert_eq!(arena.score.right, 0);
    }

    #[test]
    fn test_winning_hit_ends_match() {
        let mut arena = Arena::new(quiet());
        arena.score.left = 9;
        pin(&mut arena, Side::Right);
        arena.handle_fire(Side::Left);

        assert!(run_until(&mut arena, 200, |a| a.is_over()));
        assert_eq!(arena.winner(), Some(Side::Left));
        assert_eq!(arena.score.left, 10);
        assert!(arena
            .drain_events()
            .contains(&GameEvent::MatchOver { winner: Side::Left }));

        // Frozen in place afterwards
        let over_at = arena.now;
        arena.tick();
        assert_eq!(arena.now, over_at);
        assert_eq!(arena.renderable_state().phase, MatchPhase::Over { winner: Side::Left });
    }

    #[test]
    fn test_simultaneous_winning_hits_go_to_first_shot() {
        for first in Side::BOTH {
            let mut arena = Arena::new(quiet());
            arena.score.left = 9;
            arena.score.right = 9;
            pin(&mut arena, Side::Left);
            pin(&mut arena, Side::Right);
            arena.handle_fire(first);
            arena.handle_fire(first.opponent());
            let second_shot = arena.shots[first.opponent().index()].unwrap();

            // One step short of each target, so both land on the next tick
            for id in arena.projectiles.ids() {
                let p = arena.projectiles.get_mut(id).unwrap();
                p.rect.pos.x = match p.owner {
                    Side::Left => 900.0,
                    Side::Right => 80.0,
                };
            }
            arena.tick();

            assert_eq!(arena.winner(), Some(first));
            assert_eq!(arena.score.get(first), 10);
            assert_eq!(arena.score.get(first.opponent()), 9);
            assert!(arena.projectiles.get(second_shot).is_some());
            let events = arena.drain_events();
            let overs = events
                .iter()
                .filter(|e| matches!(e, GameEvent::MatchOver { .. }))
                .count();
            assert_eq!(overs, 1);
            assert!(events.contains(&GameEvent::MatchOver { winner: first }));
        }
    }

    #[test]
    fn test_huge_timer_settings_saturate() {
        let json = r#"{
            "seed": 5,
            "obstacle_count": 0,
            "powerup_count": 0,
            "fire_pause_ticks": 18446744073709551615,
            "freeze_ticks": 18446744073709551615,
            "invincible_ticks": 18446744073709551615
        }"#;
        let mut arena = Arena::try_new(MatchSettings::from_json(json).unwrap()).unwrap();
        pin(&mut arena, Side::Right);
        arena.tick();
        arena.handle_fire(Side::Left);
        assert_eq!(arena.player(Side::Left).fire_paused_until, Some(u64::MAX));

        assert!(run_until(&mut arena, 200, |a| a.score.left == 1));
        assert_eq!(arena.player(Side::Right).invincible_until, Some(u64::MAX));
        for _ in 0..10 {
            arena.tick();
        }
        assert!(arena.player(Side::Right).is_invincible(arena.now));
    }

    #[test]
    fn test_guns_return_after_clear_and_cooldown() {
        let mut arena = Arena::new(quiet());
        arena.handle_fire(Side::Left);
        arena.handle_fire(Side::Right);
        assert!(!arena.turns.can_fire(Side::Left));

        assert!(run_until(&mut arena, 300, |a| a.projectiles.is_empty()));
        let cleared_at = arena.now;
        let cooldown = arena.settings.reload_cooldown_ticks;

        while arena.now < cleared_at + cooldown - 1 {
            arena.tick();
            assert!(!arena.player(Side::Left).has_gun);
            assert!(!arena.player(Side::Right).has_gun);
        }
        arena.tick();
        assert!(arena.player(Side::Left).has_gun);
        assert!(arena.player(Side::Right).has_gun);
        assert!(arena.drain_events().contains(&GameEvent::Reloaded));
    }

    #[test]
    fn test_bomb_splits_into_three() {
        let mut arena = Arena::new(MatchSettings {
            powerup_spawn_grace_ticks: 0,
            ..quiet()
        });
        pin(&mut arena, Side::Right);
        arena.powerups.insert(Vec2::new(200.0, 350.0), PowerupKind::Bomb, 0);
        arena.handle_fire(Side::Left);
        let parent = arena.shots[0].unwrap();

        assert!(run_until(&mut arena, 30, |a| a.powerups.live_count() == 0));
        assert_eq!(arena.projectiles.len(), 3);
        assert_eq!(arena.projectiles.get(parent).unwrap().vel, Vec2::new(10.0, 0.0));

        let mut angles: Vec<f32> = arena.projectiles.children_of(parent).map(|c| c.rotation).collect();
        angles.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(angles.len(), 2);
        let split = std::f32::consts::PI / 6.0;
        assert!((angles[0] + split).abs() < 1e-5);
        assert!((angles[1] - split).abs() < 1e-5);
        assert_eq!(arena.renderable_state().projectiles.len(), 3);
    }

    #[test]
    fn test_powerup_ignored_during_spawn_grace() {
        let mut arena = Arena::new(quiet());
        pin(&mut arena, Side::Right);
        arena.player_mut(Side::Right).invincible_until = Some(u64::MAX);
        arena.powerups.insert(Vec2::new(200.0, 350.0), PowerupKind::BigBullet, 0);
        arena.handle_fire(Side::Left);
        let id = arena.shots[0].unwrap();

        for _ in 0..20 {
            arena.tick();
        }
        assert_eq!(arena.powerups.live_count(), 1);
        assert_eq!(arena.projectiles.get(id).unwrap().scale, 1.0);
    }

    #[test]
    fn test_fresh_powerup_does_not_shadow_armed_one() {
        let mut arena = Arena::new(quiet());
        pin(&mut arena, Side::Left);
        pin(&mut arena, Side::Right);
        arena.player_mut(Side::Right).invincible_until = Some(u64::MAX);
        let armed = arena.powerups.insert(Vec2::new(209.0, 350.0), PowerupKind::BigBullet, 0);
        for _ in 0..40 {
            arena.tick();
        }
        // Sits just in front of the armed one, still inside its grace window
        let fresh = arena
            .powerups
            .insert(Vec2::new(202.0, 350.0), PowerupKind::Bomb, arena.now);
        arena.handle_fire(Side::Left);
        let id = arena.shots[0].unwrap();

        assert!(run_until(&mut arena, 20, |a| a.powerups.get(armed).is_none()));
        assert_eq!(arena.projectiles.get(id).unwrap().scale, 2.0);
        assert_eq!(arena.projectiles.len(), 1);
        assert!(arena.powerups.get(fresh).is_some());
    }

    #[test]
    fn test_freeze_retargets_then_freezes_on_hit() {
        let mut arena = Arena::new(MatchSettings {
            powerup_spawn_grace_ticks: 0,
            ..quiet()
        });
        arena.player_mut(Side::Right).speed = 0.0;
        arena.powerups.insert(Vec2::new(200.0, 350.0), PowerupKind::Freeze, 0);
        arena.handle_fire(Side::Left);
        let id = arena.shots[0].unwrap();

        assert!(run_until(&mut arena, 30, |a| a.powerups.live_count() == 0));
        let p = arena.projectiles.get(id).unwrap();
        assert_eq!(p.freeze_target, Some(Side::Right));
        assert_eq!(arena.player(Side::Right).marked_by, Some(id));

        assert!(run_until(&mut arena, 200, |a| a.score.left == 1));
        let hit_at = arena.now;
        let right = arena.player(Side::Right);
        assert_eq!(right.frozen_until, Some(hit_at + 120));
        assert_eq!(right.marked_by, None);
        assert!(arena.drain_events().contains(&GameEvent::Frozen {
            side: Side::Right,
            until: hit_at + 120
        }));
    }

    #[test]
    fn test_freeze_mark_dropped_when_projectile_leaves() {
        let mut arena = Arena::new(MatchSettings {
            powerup_spawn_grace_ticks: 0,
            ..quiet()
        });
        arena.powerups.insert(Vec2::new(200.0, 350.0), PowerupKind::Freeze, 0);
        arena.handle_fire(Side::Left);
        let id = arena.shots[0].unwrap();
        assert!(run_until(&mut arena, 30, |a| a.powerups.live_count() == 0));
        assert_eq!(arena.player(Side::Right).marked_by, Some(id));

        arena.projectiles.get_mut(id).unwrap().rect.pos.x = 2000.0;
        arena.tick();
        assert!(arena.projectiles.is_empty());
        assert_eq!(arena.player(Side::Right).marked_by, None);
    }

    #[test]
    fn test_broken_obstacle_returns_after_delay() {
        let settings = MatchSettings {
            seed: Some(3),
            obstacle_count: 1,
            powerup_count: 0,
            ..Default::default()
        };
        let delay = settings.obstacle_regen_ticks;
        let mut arena = Arena::new(settings);
        assert_eq!(arena.obstacles.live_count(), 1);
        let center = arena.obstacles.live()[0].circle.center;

        // Line the shooter up with the obstacle
        pin(&mut arena, Side::Left);
        let half = arena.player(Side::Left).rect.size.y / 2.0;
        arena.player_mut(Side::Left).rect.pos.y = center.y - half;
        arena.handle_fire(Side::Left);
        let id = arena.shots[0].unwrap();

        assert!(run_until(&mut arena, 100, |a| a.obstacles.live_count() == 0));
        let broken_at = arena.now;
        assert_eq!(arena.obstacles.pending()[0].consumed_at, broken_at);
        assert!(arena.projectiles.get(id).unwrap().vel.x < 0.0);

        while arena.now < broken_at + delay - 1 {
            arena.tick();
            assert_eq!(arena.obstacles.live_count(), 0);
        }
        arena.tick();
        assert_eq!(arena.obstacles.live_count(), 1);
    }

    #[test]
    fn test_regenerated_fields_keep_apart() {
        let mut arena = Arena::new(MatchSettings {
            seed: Some(11),
            obstacle_regen_ticks: 5,
            powerup_regen_ticks: 5,
            ..Default::default()
        });
        let padding = arena.settings.placement_padding;
        let mut placed = 0;

        for _ in 0..12 {
            let now = arena.now;
            let obstacles: Vec<u32> = arena.obstacles.live().iter().map(|e| e.id).collect();
            for id in obstacles {
                arena.obstacles.consume(id, now);
            }
            let powerups: Vec<u32> = arena.powerups.live().iter().map(|e| e.id).collect();
            for id in powerups {
                arena.powerups.consume(id, now);
            }

            for _ in 0..6 {
                arena.tick();
                for powerup in arena.powerups.circles() {
                    for obstacle in arena.obstacles.circles() {
                        assert!(
                            !powerup.crowds(&obstacle, padding),
                            "{:?} crowds {:?} at tick {}",
                            powerup,
                            obstacle,
                            arena.now
                        );
                    }
                }
            }
            placed += arena.obstacles.live_count() + arena.powerups.live_count();
        }
        assert!(placed > 0);
    }

    #[test]
    fn test_pause_holds_the_clock() {
        let mut arena = Arena::new(quiet());
        arena.tick();
        arena.apply(InputEvent::TogglePause);
        for _ in 0..10 {
            arena.tick();
        }
        assert_eq!(arena.now, 1);

        arena.apply(InputEvent::TogglePause);
        arena.tick();
        assert_eq!(arena.now, 2);
    }

    #[test]
    fn test_apply_routes_fire_input() {
        let mut arena = Arena::new(quiet());
        arena.apply(InputEvent::FireDown(Side::Right));
        arena.apply(InputEvent::FireUp(Side::Right));
        assert_eq!(arena.projectiles.len(), 1);
        assert!(!arena.player(Side::Right).trigger_held);

        arena.apply(InputEvent::Reset);
        assert!(arena.projectiles.is_empty());
    }

    #[test]
    fn test_same_seed_same_match() {
        let settings = MatchSettings {
            seed: Some(42),
            ..Default::default()
        };
        let mut a = Arena::new(settings.clone());
        let mut b = Arena::new(settings);

        let script = [
            (0, InputEvent::FireDown(Side::Left)),
            (3, InputEvent::FireUp(Side::Left)),
            (40, InputEvent::FireDown(Side::Right)),
            (41, InputEvent::FireUp(Side::Right)),
            (60, InputEvent::FireDown(Side::Left)),
        ];
        for t in 0..600 {
            for &(at, input) in &script {
                if at == t {
                    a.apply(input);
                    b.apply(input);
                }
            }
            a.tick();
            b.tick();
        }

        assert_eq!(a.renderable_state(), b.renderable_state());
        assert_eq!(a.drain_events(), b.drain_events());
    }
}
