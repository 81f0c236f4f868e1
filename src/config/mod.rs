//! Dig core configuration.
//!
//! Loaded from `config/dig.ron` (or a `.json` file) at startup. Every field
//! has a default so partial files are accepted; the result is validated
//! before the service is built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::loot::LootTables;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON write error: {0}")]
    RonWrite(#[from] ron::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigConfig {
    pub dig_range: f32,
    pub anti_cheat_range_multiplier: f32,
    pub decay_rate_per_second: f64,
    pub dig_cooldown_secs: f64,
    pub success_cooldown_secs: f64,
    pub target_lifetime_secs: f64,
    pub base_max_progress: f64,
    pub progress_per_weight: f64,
    pub base_shovel_strength: f64,
    pub experience_per_weight: f64,
    pub double_strength_entitlement: String,
    pub spawn_search_radius: f32,
    pub fallback_search_radius: f32,
    pub spawn_max_attempts: u32,
    pub spawn_retry_base_secs: f64,
    pub spawn_retry_max_secs: f64,
    pub waypoint_interval_secs: f64,
    pub waypoint_min_displacement: f32,
    pub tick_rate: u32,
    /// Fixed RNG seed (None = seeded from entropy)
    pub rng_seed: Option<u64>,
    pub tables: LootTables,
}

impl Default for DigConfig {
    fn default() -> Self {
        Self {
            dig_range: DIG_RANGE,
            anti_cheat_range_multiplier: ANTI_CHEAT_RANGE_MULTIPLIER,
            decay_rate_per_second: DECAY_RATE_PER_SECOND,
            dig_cooldown_secs: DIG_COOLDOWN_SECS,
            success_cooldown_secs: SUCCESS_COOLDOWN_SECS,
            target_lifetime_secs: TARGET_LIFETIME_SECS,
            base_max_progress: BASE_MAX_PROGRESS,
            progress_per_weight: PROGRESS_PER_WEIGHT,
            base_shovel_strength: BASE_SHOVEL_STRENGTH,
            experience_per_weight: EXPERIENCE_PER_WEIGHT,
            double_strength_entitlement: DOUBLE_STRENGTH_ENTITLEMENT.into(),
            spawn_search_radius: SPAWN_SEARCH_RADIUS,
            fallback_search_radius: FALLBACK_SEARCH_RADIUS,
            spawn_max_attempts: SPAWN_MAX_ATTEMPTS,
            spawn_retry_base_secs: SPAWN_RETRY_BASE_SECS,
            spawn_retry_max_secs: SPAWN_RETRY_MAX_SECS,
            waypoint_interval_secs: WAYPOINT_INTERVAL_SECS,
            waypoint_min_displacement: WAYPOINT_MIN_DISPLACEMENT,
            tick_rate: TICK_RATE,
            rng_seed: None,
            tables: LootTables::default(),
        }
    }
}

impl DigConfig {
    /// Load and validate a `.ron` or `.json` config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => ron::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("dig_range", self.dig_range as f64),
            ("spawn_search_radius", self.spawn_search_radius as f64),
            ("fallback_search_radius", self.fallback_search_radius as f64),
            ("base_max_progress", self.base_max_progress),
            ("tick_rate", self.tick_rate as f64),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }

        let non_negative = [
            ("decay_rate_per_second", self.decay_rate_per_second),
            ("dig_cooldown_secs", self.dig_cooldown_secs),
            ("success_cooldown_secs", self.success_cooldown_secs),
            ("target_lifetime_secs", self.target_lifetime_secs),
            ("progress_per_weight", self.progress_per_weight),
            ("base_shovel_strength", self.base_shovel_strength),
            ("experience_per_weight", self.experience_per_weight),
            ("spawn_retry_base_secs", self.spawn_retry_base_secs),
            ("spawn_retry_max_secs", self.spawn_retry_max_secs),
            ("waypoint_interval_secs", self.waypoint_interval_secs),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be >= 0")));
            }
        }

        if self.anti_cheat_range_multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "anti_cheat_range_multiplier must be >= 1".into(),
            ));
        }
        // Fallback targets start digging within this radius of the owner
        if self.fallback_search_radius >= self.dig_range {
            return Err(ConfigError::Invalid(
                "fallback_search_radius must be smaller than dig_range".into(),
            ));
        }
        if self.spawn_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "spawn_max_attempts must be at least 1".into(),
            ));
        }

        self.tables.validate()
    }

    /// max_progress for an instance of the given weight
    pub fn max_progress_for(&self, weight: f64) -> f64 {
        self.base_max_progress + weight.max(0.0) * self.progress_per_weight
    }

    pub fn anti_cheat_range(&self) -> f32 {
        self.dig_range * self.anti_cheat_range_multiplier
    }

    pub fn tick_interval_secs(&self) -> f64 {
        1.0 / self.tick_rate.max(1) as f64
    }
}
