//! Player identity, profile snapshot and held tools.
//!
//! The profile is owned by the persistence collaborator. The dig core only
//! ever sees immutable snapshots of it and writes back whole values.

mod cooldown;

pub use cooldown::Cooldown;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque player identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// What the player currently holds in hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Empty,
    Detector,
    Shovel,
}

/// Profile fields the dig core reads (and the dig statistics it writes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Skill-tree luck multiplier
    pub luck: f64,
    /// Base dig strength before tool bonuses
    pub strength: f64,
    /// Owned detector (key into the detector table)
    pub detector: Option<String>,
    /// Owned shovel (key into the shovel table)
    pub shovel: String,
    /// Map the player is currently in
    pub current_map: String,
    /// Extra rolls granted on every successful dig
    pub multi_dig_level: u32,
    /// Active luck potion multiplier (1.0 when none)
    pub luck_potion_multiplier: f64,
    pub total_digs: u64,
    pub dig_streak: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            luck: 1.0,
            strength: 1.0,
            detector: Some("Basic Detector".into()),
            shovel: "Wooden Shovel".into(),
            current_map: "Meadow".into(),
            multi_dig_level: 0,
            luck_potion_multiplier: 1.0,
            total_digs: 0,
            dig_streak: 0,
        }
    }
}

impl Profile {
    /// Tool a freshly connected player starts out holding
    pub fn starting_tool(&self) -> Tool {
        if self.detector.is_some() {
            Tool::Detector
        } else {
            Tool::Empty
        }
    }

    /// Profile after a successful dig
    pub fn with_success(&self) -> Self {
        Self {
            total_digs: self.total_digs.saturating_add(1),
            dig_streak: self.dig_streak.saturating_add(1),
            ..self.clone()
        }
    }

    /// Profile after a failed dig
    pub fn with_failure(&self) -> Self {
        Self {
            dig_streak: 0,
            ..self.clone()
        }
    }
}
