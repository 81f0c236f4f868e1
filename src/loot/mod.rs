//! Loot generation for dig targets.
//!
//! A target is drawn from the map's allowed candidates, weighted by
//! `(1 / rarity)^(1 - luck)`: luck 0 makes common items dominate, luck 1
//! flattens the draw to uniform. The sampled weight stat is biased upward
//! by the same luck.

mod selector;
mod tables;

pub use selector::{CumulativeTable, LootSelector};
pub use tables::{Candidate, DetectorStats, LootTables, ShovelStats};

use serde::{Deserialize, Serialize};

/// Which part of the catalog a roll may draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidatePool {
    /// Every catalog entry (detector-driven spawns)
    Treasure,
    /// Only entries flagged as trash ("dig anywhere" fallback)
    Trash,
}

/// How a dug-up instance is paid out
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RewardKind {
    /// Goes to the inventory collaborator
    #[default]
    Item,
    /// Converted to currency: round(weight * per_weight)
    Currency { per_weight: f64 },
}

/// Result of one selector draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootRoll {
    pub name: String,
    pub weight: f64,
    pub reward: RewardKind,
}
