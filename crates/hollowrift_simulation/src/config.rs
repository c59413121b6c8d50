//! Конфиг симуляции (RON)
//!
//! ```ron
//! (
//!     seed: 7,
//!     fixed_hz: 60.0,
//!     log_level: Info,
//!     ai: (chase_range: 25.0, attack_range: 2.0),
//!     director: (credit_gain_per_second: 2.0),
//! )
//! ```
//!
//! Все поля опциональны (`#[serde(default)]`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::ai::AiConfig;
use crate::controller::FloatingCapsule;
use crate::logger::LogLevel;
use crate::navigation::WalkableArea;
use crate::pool::PoolSettings;
use crate::spawning::{ChestConfig, DirectorConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Размеры pool'ов по прототипам
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSizes {
    pub projectiles: PoolSettings,
    pub summons: PoolSettings,
    pub heal_zones: PoolSettings,
    pub enemies: PoolSettings,
    pub chests: PoolSettings,
    pub item_pickups: PoolSettings,
}

impl Default for PoolSizes {
    fn default() -> Self {
        Self {
            projectiles: PoolSettings {
                initial_size: 32,
                expandable: true,
            },
            summons: PoolSettings {
                initial_size: 4,
                expandable: true,
            },
            heal_zones: PoolSettings {
                initial_size: 2,
                expandable: true,
            },
            enemies: PoolSettings {
                initial_size: 16,
                expandable: true,
            },
            chests: PoolSettings {
                initial_size: 20,
                expandable: true,
            },
            item_pickups: PoolSettings {
                initial_size: 4,
                expandable: true,
            },
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Частота FixedUpdate
    pub fixed_hz: f64,
    pub log_level: LogLevel,
    /// AI по умолчанию (враги директора, призванные союзники)
    pub ai: AiConfig,
    /// Тюнинг капсулы игрока
    pub player_controller: FloatingCapsule,
    pub director: DirectorConfig,
    pub chests: ChestConfig,
    /// None — без walkable area (директор не спавнит, сундуков нет)
    pub walkable_area: Option<WalkableArea>,
    pub pools: PoolSizes,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            fixed_hz: 60.0,
            log_level: LogLevel::Info,
            ai: AiConfig::default(),
            player_controller: FloatingCapsule::default(),
            director: DirectorConfig::default(),
            chests: ChestConfig::default(),
            walkable_area: Some(WalkableArea::default()),
            pools: PoolSizes::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&source)?;
        crate::logger::log_info(&format!(
            "⚙️ Loaded config {} (seed {})",
            path.as_ref().display(),
            config.seed
        ));
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_hz.is_nan() || self.fixed_hz <= 0.0 {
            return Err(invalid(format!("fixed_hz must be positive, got {}", self.fixed_hz)));
        }

        let capsule = &self.player_controller;
        if capsule.ride_height <= 0.0 {
            return Err(invalid(format!(
                "ride_height must be positive, got {}",
                capsule.ride_height
            )));
        }
        if capsule.ray_to_ground_length <= capsule.ride_height {
            return Err(invalid(format!(
                "ray_to_ground_length ({}) must exceed ride_height ({})",
                capsule.ray_to_ground_length, capsule.ride_height
            )));
        }

        if self.ai.attack_range > self.ai.chase_range {
            return Err(invalid(format!(
                "ai.attack_range ({}) must not exceed ai.chase_range ({})",
                self.ai.attack_range, self.ai.chase_range
            )));
        }
        if self.ai.windup_time < 0.0 {
            return Err(invalid("ai.windup_time must not be negative".to_string()));
        }

        let director = &self.director;
        if director.credit_gain_per_second < 0.0 || director.difficulty < 0.0 {
            return Err(invalid(
                "director credit gain and difficulty must not be negative".to_string(),
            ));
        }
        if let Some(card) = director
            .cards
            .iter()
            .find(|card| card.cost <= 0.0 || card.min_distance > card.max_distance)
        {
            return Err(invalid(format!(
                "spawn card {} needs a positive cost and min_distance <= max_distance",
                card.name
            )));
        }

        let chests = &self.chests;
        if !(0.0..=90.0).contains(&chests.max_slope) {
            return Err(invalid(format!(
                "chests.max_slope must be within 0..=90 degrees, got {}",
                chests.max_slope
            )));
        }
        if chests.count > 0 && chests.max_attempts == 0 {
            return Err(invalid("chests.max_attempts must be positive".to_string()));
        }

        if let Some(area) = &self.walkable_area {
            if area.min.x > area.max.x || area.min.y > area.max.y {
                return Err(invalid("walkable_area min must not exceed max".to_string()));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SimulationConfig::from_ron_str(
            "(seed: 7, log_level: Warning, ai: (chase_range: 25.0), director: (difficulty: 2.0))",
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.log_level, LogLevel::Warning);
        assert_eq!(config.ai.chase_range, 25.0);
        assert_eq!(config.ai.attack_range, AiConfig::default().attack_range);
        assert_eq!(config.director.difficulty, 2.0);
        assert_eq!(config.fixed_hz, 60.0);
        assert_eq!(config.pools, PoolSizes::default());
        assert_eq!(config.chests, ChestConfig::default());
    }

    #[test]
    fn test_round_trip_through_ron() {
        let mut config = SimulationConfig::default();
        config.seed = 1234;
        config.walkable_area = None;

        let text = config.to_ron_string().unwrap();
        assert_eq!(SimulationConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = SimulationConfig::from_ron_str("(seed: \"nope\")").unwrap_err();
        assert!(matches!(err, ConfigError::Ron(_)));
    }

    #[test]
    fn test_validation_rejects_bad_tuning() {
        let err = SimulationConfig::from_ron_str(
            "(player_controller: (ride_height: 1.5, ray_to_ground_length: 1.0))",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err =
            SimulationConfig::from_ron_str("(ai: (chase_range: 5.0, attack_range: 10.0))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimulationConfig::from_ron_str("(fixed_hz: 0.0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimulationConfig::from_ron_str("(chests: (max_slope: 120.0))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = SimulationConfig::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
