//! Game Configuration
//!
//! Tunables for difficulty, timing, hitboxes and obstacles. Defaults match the
//! shipped game; any subset can be overridden from JSON.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::obstacle::ObstacleSize;

/// Difficulty curve parameters. All durations in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Obstacle traversal period at score 0.
    pub base_speed_ms: u64,
    /// Fastest allowed traversal period.
    pub min_speed_ms: u64,
    /// Score points per speed step.
    pub score_step: u64,
    /// Traversal period removed per step.
    pub speed_step_ms: u64,
    /// Jump duration at base speed.
    pub base_jump_duration_ms: u64,
    /// Shortest allowed jump.
    pub min_jump_duration_ms: u64,
    /// Score at which the background starts alternating.
    pub background_threshold: u64,
    /// Score band per background alternation.
    pub background_band: u64,
    /// Upper bound on waiting for the obstacle to clear.
    pub safety_timeout_ms: u64,
    /// Off-screen poll period while a change is pending.
    pub offscreen_poll_ms: u64,
    /// Hold a pending change while the player is airborne.
    pub defer_during_jump: bool,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_speed_ms: 4000,
            min_speed_ms: 1000,
            score_step: 1000,
            speed_step_ms: 400,
            base_jump_duration_ms: 1200,
            min_jump_duration_ms: 800,
            background_threshold: 3000,
            background_band: 1000,
            safety_timeout_ms: 10_000,
            offscreen_poll_ms: 50,
            defer_during_jump: true,
        }
    }
}

/// Fixed loop periods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// One score point per period.
    pub score_increment_ms: u64,
    /// Collision poll period.
    pub collision_check_ms: u64,
    /// Jump requests closer than this to the last accepted jump are dropped.
    pub jump_debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            score_increment_ms: 50,
            collision_check_ms: 20,
            jump_debounce_ms: 100,
        }
    }
}

/// A player sample point: fractional x across the box, plus a y anchor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "anchor", rename_all = "snake_case")]
pub enum SampleAnchor {
    /// `bottom - inset_px`.
    Bottom {
        /// Fraction of width from the left edge.
        fx: f64,
        /// Pixels above the bottom edge.
        inset_px: f64,
    },
    /// `top + inset_px`.
    Top {
        /// Fraction of width from the left edge.
        fx: f64,
        /// Pixels below the top edge.
        inset_px: f64,
    },
    /// Fraction of height from the top.
    Fraction {
        /// Fraction of width from the left edge.
        fx: f64,
        /// Fraction of height from the top edge.
        fy: f64,
    },
}

/// Hitbox shapes used by the collision detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Obstacle silhouette vertices as `(fx, fy)` fractions of its box.
    pub obstacle_hull: Vec<(f64, f64)>,
    /// Player sample points.
    pub player_samples: Vec<SampleAnchor>,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            obstacle_hull: vec![(0.20, 0.00), (0.80, 0.20), (1.00, 1.00), (0.00, 1.00)],
            player_samples: vec![
                SampleAnchor::Bottom { fx: 0.2, inset_px: 8.0 },
                SampleAnchor::Bottom { fx: 0.8, inset_px: 8.0 },
                SampleAnchor::Fraction { fx: 0.5, fy: 0.8 },
                SampleAnchor::Top { fx: 0.5, inset_px: 5.0 },
            ],
        }
    }
}

/// Obstacle catalogue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Sizes drawn uniformly on each spawn.
    pub sizes: Vec<ObstacleSize>,
    /// Name of the traversal animation the renderer must be running.
    pub animation_name: String,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            sizes: vec![ObstacleSize::Small, ObstacleSize::Medium, ObstacleSize::Large],
            animation_name: "move".to_string(),
        }
    }
}

/// Complete game configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Difficulty curve.
    pub difficulty: DifficultyConfig,
    /// Loop periods.
    pub timing: TimingConfig,
    /// Hitboxes.
    pub collision: CollisionConfig,
    /// Obstacles.
    pub obstacle: ObstacleConfig,
    /// Require a backend session key and run integrity checks.
    pub anti_cheat: bool,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// JSON did not match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// Values parse but make no sense together.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl GameConfig {
    /// Defaults with anti-cheat switched on.
    pub fn protected() -> Self {
        Self {
            anti_cheat: true,
            ..Default::default()
        }
    }

    /// Parse and validate from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.difficulty;
        if d.min_speed_ms == 0 || d.min_speed_ms > d.base_speed_ms {
            return Err(ConfigError::Invalid("min_speed_ms must be in 1..=base_speed_ms".into()));
        }
        if d.min_jump_duration_ms > d.base_jump_duration_ms {
            return Err(ConfigError::Invalid("min_jump_duration_ms exceeds base_jump_duration_ms".into()));
        }
        if d.score_step == 0 || d.background_band == 0 {
            return Err(ConfigError::Invalid("score_step and background_band must be positive".into()));
        }
        if self.obstacle.sizes.is_empty() {
            return Err(ConfigError::Invalid("at least one obstacle size is required".into()));
        }
        if self.collision.obstacle_hull.len() < 3 {
            return Err(ConfigError::Invalid("obstacle hull needs at least 3 vertices".into()));
        }
        if self.collision.player_samples.is_empty() {
            return Err(ConfigError::Invalid("at least one player sample is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
        assert!(GameConfig::protected().anti_cheat);
    }

    #[test]
    fn test_partial_json_override() {
        let config = GameConfig::from_json(r#"{
            "difficulty": { "speed_step_ms": 500 },
            "anti_cheat": true
        }"#).unwrap();

        assert_eq!(config.difficulty.speed_step_ms, 500);
        assert_eq!(config.difficulty.base_speed_ms, 4000);
        assert_eq!(config.timing.collision_check_ms, 20);
        assert!(config.anti_cheat);
    }

    #[test]
    fn test_sample_anchor_json() {
        let config = GameConfig::from_json(r#"{
            "collision": { "player_samples": [ { "anchor": "top", "fx": 0.5, "inset_px": 2.0 } ] }
        }"#).unwrap();
        assert_eq!(config.collision.player_samples, vec![SampleAnchor::Top { fx: 0.5, inset_px: 2.0 }]);
    }

    #[test]
    fn test_invalid_speed_rejected() {
        let result = GameConfig::from_json(r#"{ "difficulty": { "min_speed_ms": 5000 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_sizes_rejected() {
        let result = GameConfig::from_json(r#"{ "obstacle": { "sizes": [] } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = GameConfig::from_json_file("/nonexistent/hurdle.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
