//! Match settings
//!
//! Every gameplay tunable in one serializable struct. Missing keys in a
//! settings file fall back to the defaults in [`crate::consts`], so a file
//! only needs to name the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Match settings/tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// RNG seed; `None` picks one from the OS at arena creation
    pub seed: Option<u64>,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    /// Fraction of the height kept clear at the top for players and projectiles
    pub top_margin_ratio: f32,

    // === Players ===
    pub player_width: f32,
    pub player_height: f32,
    /// Distance from the screen edge to the player's outer side
    pub player_inset: f32,
    /// Vertical patrol speed (pixels per tick)
    pub player_speed: f32,

    // === Projectiles ===
    pub projectile_width: f32,
    pub projectile_height: f32,
    /// Pixels per tick
    pub projectile_speed: f32,
    pub min_horizontal_ratio: f32,
    pub bounce_horizontal_clamp: f32,
    pub big_bullet_multiplier: f32,
    pub split_angle_degrees: f32,

    // === Timers (ticks) ===
    pub fire_pause_ticks: u64,
    pub freeze_ticks: u64,
    pub invincible_ticks: u64,
    pub reload_cooldown_ticks: u64,

    // === Obstacles ===
    pub obstacle_count: usize,
    pub obstacle_radius: f32,
    pub obstacle_regen_ticks: u64,
    pub obstacle_band_margin: f32,

    // === Powerups ===
    pub powerup_count: usize,
    pub powerup_radius: f32,
    pub powerup_regen_ticks: u64,
    pub powerup_spawn_grace_ticks: u64,
    pub powerup_band_margin: f32,

    // === Placement ===
    pub placement_padding: f32,
    pub placement_attempts: u32,

    // === Scoring ===
    pub win_score: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            seed: None,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            top_margin_ratio: TOP_MARGIN_RATIO,

            player_width: PLAYER_WIDTH,
            player_height: PLAYER_HEIGHT,
            player_inset: PLAYER_INSET,
            player_speed: PLAYER_SPEED,

            projectile_width: PROJECTILE_WIDTH,
            projectile_height: PROJECTILE_HEIGHT,
            projectile_speed: PROJECTILE_SPEED,
            min_horizontal_ratio: MIN_HORIZONTAL_RATIO,
            bounce_horizontal_clamp: BOUNCE_HORIZONTAL_CLAMP,
            big_bullet_multiplier: BIG_BULLET_MULTIPLIER,
            split_angle_degrees: SPLIT_ANGLE_DEGREES,

            fire_pause_ticks: FIRE_PAUSE_TICKS,
            freeze_ticks: FREEZE_TICKS,
            invincible_ticks: INVINCIBLE_TICKS,
            reload_cooldown_ticks: RELOAD_COOLDOWN_TICKS,

            obstacle_count: OBSTACLE_COUNT,
            obstacle_radius: OBSTACLE_RADIUS,
            obstacle_regen_ticks: OBSTACLE_REGEN_TICKS,
            obstacle_band_margin: OBSTACLE_BAND_MARGIN,

            powerup_count: POWERUP_COUNT,
            powerup_radius: POWERUP_RADIUS,
            powerup_regen_ticks: POWERUP_REGEN_TICKS,
            powerup_spawn_grace_ticks: POWERUP_SPAWN_GRACE_TICKS,
            powerup_band_margin: POWERUP_BAND_MARGIN,

            placement_padding: PLACEMENT_PADDING,
            placement_attempts: PLACEMENT_ATTEMPTS,

            win_score: WIN_SCORE,
        }
    }
}

impl MatchSettings {
    /// Y coordinate of the top margin line
    #[inline]
    pub fn top_margin(&self) -> f32 {
        self.arena_height * self.top_margin_ratio
    }

    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::invalid(field, format!("must be > 0, got {}", value)))
            }
        }
        fn ratio(field: &'static str, value: f32, max: f32) -> Result<(), SettingsError> {
            if (0.0..max).contains(&value) {
                Ok(())
            } else {
                Err(SettingsError::invalid(
                    field,
                    format!("must be in [0, {}), got {}", max, value),
                ))
            }
        }

        positive("arena_width", self.arena_width)?;
        positive("arena_height", self.arena_height)?;
        ratio("top_margin_ratio", self.top_margin_ratio, 0.5)?;
        positive("player_width", self.player_width)?;
        positive("player_height", self.player_height)?;
        positive("player_speed", self.player_speed)?;
        positive("projectile_width", self.projectile_width)?;
        positive("projectile_height", self.projectile_height)?;
        positive("projectile_speed", self.projectile_speed)?;
        ratio("min_horizontal_ratio", self.min_horizontal_ratio, 1.0)?;
        ratio("bounce_horizontal_clamp", self.bounce_horizontal_clamp, 1.0)?;
        positive("big_bullet_multiplier", self.big_bullet_multiplier)?;
        positive("obstacle_radius", self.obstacle_radius)?;
        positive("powerup_radius", self.powerup_radius)?;
        ratio("obstacle_band_margin", self.obstacle_band_margin, 0.5)?;
        ratio("powerup_band_margin", self.powerup_band_margin, 0.5)?;

        if self.placement_padding < 0.0 {
            return Err(SettingsError::invalid(
                "placement_padding",
                "must not be negative",
            ));
        }
        if self.player_height + self.top_margin() > self.arena_height {
            return Err(SettingsError::invalid(
                "player_height",
                "player does not fit between the top margin and the floor",
            ));
        }
        if self.win_score == 0 {
            return Err(SettingsError::invalid("win_score", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = MatchSettings::default();
        assert!(settings.validate().is_ok());
        assert!((settings.top_margin() - 60.0).abs() < 0.001);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = MatchSettings::from_json(r#"{ "win_score": 3, "seed": 7 }"#).unwrap();
        assert_eq!(settings.win_score, 3);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.obstacle_count, OBSTACLE_COUNT);
        assert_eq!(settings.powerup_regen_ticks, POWERUP_REGEN_TICKS);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = MatchSettings::from_json(r#"{ "win_score": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "win_score", .. }));

        let err = MatchSettings::from_json(r#"{ "projectile_speed": -1.0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "projectile_speed", .. }));

        let err = MatchSettings::from_json(r#"{ "min_horizontal_ratio": 1.5 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "min_horizontal_ratio", .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = MatchSettings::from_json("{ win_score: ").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_save_load_file() {
        let path = std::env::temp_dir().join(format!("duel_settings_{}.json", std::process::id()));
        let settings = MatchSettings {
            seed: Some(42),
            obstacle_count: 2,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        let loaded = MatchSettings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MatchSettings::load("/definitely/not/here/settings.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
