//! Audio cue seam
//!
//! The simulation never plays sound. It queues `GameEvent`s; the host drains
//! them after each tick and hands them to `dispatch`, which fans them out to
//! an `AudioCues` implementation. Cues are fire-and-forget.

use crate::sim::{GameEvent, PowerupKind, Side};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Gun fired
    Shot,
    /// Obstacle broken by a ricochet
    ObstacleBreak,
    /// Projectile split in three
    Bomb,
    /// Projectile turned toward its target
    FreezeArm,
    /// Projectile grew
    BigBullet,
    /// Player struck
    Hit,
    /// Pause toggled
    Pause,
    /// Match decided
    MatchOver,
}

impl SoundEffect {
    pub fn for_powerup(kind: PowerupKind) -> Self {
        match kind {
            PowerupKind::Bomb => SoundEffect::Bomb,
            PowerupKind::Freeze => SoundEffect::FreezeArm,
            PowerupKind::BigBullet => SoundEffect::BigBullet,
        }
    }
}

/// Receiver for simulation audio cues
pub trait AudioCues {
    fn on_fire(&mut self, side: Side);
    fn on_obstacle_bounce(&mut self);
    fn on_powerup_activated(&mut self, kind: PowerupKind);
    fn on_hit(&mut self, target: Side);

    fn on_pause(&mut self, _paused: bool) {}

    fn on_match_over(&mut self, _winner: Side) {}
}

/// Forward each event that has a cue; the rest are ignored
pub fn dispatch<A: AudioCues + ?Sized>(events: &[GameEvent], cues: &mut A) {
    for event in events {
        match *event {
            GameEvent::Fired { side, .. } => cues.on_fire(side),
            GameEvent::ObstacleBounce { .. } => cues.on_obstacle_bounce(),
            GameEvent::PowerupActivated { kind, .. } => cues.on_powerup_activated(kind),
            GameEvent::Hit { target, .. } => cues.on_hit(target),
            GameEvent::Paused { paused } => cues.on_pause(paused),
            GameEvent::MatchOver { winner } => cues.on_match_over(winner),
            GameEvent::Dodged { .. } | GameEvent::Frozen { .. } | GameEvent::Reloaded => {}
        }
    }
}

/// Audio manager for headless runs
///
/// Applies volume and mute, then logs what would have played.
pub struct AudioManager {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    played: u64,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            played: 0,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Effects actually played (muted ones excluded)
    pub fn played(&self) -> u64 {
        self.played
    }

    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.played += 1;
        log::debug!("sfx {:?} at volume {:.2}", effect, vol);
    }
}

impl AudioCues for AudioManager {
    fn on_fire(&mut self, _side: Side) {
        self.play(SoundEffect::Shot);
    }

    fn on_obstacle_bounce(&mut self) {
        self.play(SoundEffect::ObstacleBreak);
    }

    fn on_powerup_activated(&mut self, kind: PowerupKind) {
        self.play(SoundEffect::for_powerup(kind));
    }

    fn on_hit(&mut self, _target: Side) {
        self.play(SoundEffect::Hit);
    }

    fn on_pause(&mut self, _paused: bool) {
        self.play(SoundEffect::Pause);
    }

    fn on_match_over(&mut self, _winner: Side) {
        self.play(SoundEffect::MatchOver);
    }
}
