use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{CandidatePool, RewardKind};
use crate::config::ConfigError;

/// Catalog entry for one diggable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Weight divisor; lower is more common
    pub rarity: f64,
    pub min_weight: f64,
    pub max_weight: f64,
    #[serde(default)]
    pub trash: bool,
    #[serde(default)]
    pub reward: RewardKind,
}

impl Candidate {
    fn item(rarity: f64, min_weight: f64, max_weight: f64, trash: bool) -> Self {
        Self {
            rarity,
            min_weight,
            max_weight,
            trash,
            reward: RewardKind::Item,
        }
    }

    pub fn in_pool(&self, pool: CandidatePool) -> bool {
        match pool {
            CandidatePool::Treasure => true,
            CandidatePool::Trash => self.trash,
        }
    }

    /// Selection weight for a normalized luck in [0, 1]
    pub fn selection_weight(&self, luck: f64) -> f64 {
        (1.0 / self.rarity).powf(1.0 - luck)
    }

    /// Weight stat sampled in [min, min + (max - min) * luck]
    pub fn sample_weight<R: Rng + ?Sized>(&self, luck: f64, rng: &mut R) -> f64 {
        let upper = self.min_weight + (self.max_weight - self.min_weight) * luck;
        if upper <= self.min_weight {
            self.min_weight
        } else {
            rng.gen_range(self.min_weight..=upper)
        }
    }
}

/// Detector stats (luck source and search radius)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorStats {
    pub luck: f64,
    pub search_radius: f32,
}

/// Shovel stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShovelStats {
    pub strength_multiplier: f64,
}

impl Default for ShovelStats {
    fn default() -> Self {
        Self {
            strength_multiplier: 1.0,
        }
    }
}

/// Static content tables: maps, candidate catalog and tool stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootTables {
    /// map name -> allowed candidate names
    pub maps: BTreeMap<String, Vec<String>>,
    pub candidates: BTreeMap<String, Candidate>,
    pub detectors: BTreeMap<String, DetectorStats>,
    pub shovels: BTreeMap<String, ShovelStats>,
}

impl Default for LootTables {
    fn default() -> Self {
        let candidates: BTreeMap<String, Candidate> = [
            ("Rusty Nail", Candidate::item(1.0, 0.05, 0.2, true)),
            ("Bottle Cap", Candidate::item(2.0, 0.02, 0.1, true)),
            ("Old Boot", Candidate::item(4.0, 0.5, 1.5, true)),
            (
                "Coin Pouch",
                Candidate {
                    rarity: 8.0,
                    min_weight: 0.2,
                    max_weight: 2.0,
                    trash: true,
                    reward: RewardKind::Currency { per_weight: 25.0 },
                },
            ),
            ("Silver Ring", Candidate::item(25.0, 0.05, 0.3, false)),
            ("Gold Nugget", Candidate::item(80.0, 0.5, 4.0, false)),
            ("Ancient Amulet", Candidate::item(300.0, 0.3, 1.2, false)),
            ("Fossil Skull", Candidate::item(600.0, 5.0, 20.0, false)),
            ("Dragon Egg", Candidate::item(2500.0, 8.0, 30.0, false)),
        ]
        .into_iter()
        .map(|(name, c)| (name.to_string(), c))
        .collect();

        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let maps = BTreeMap::from([
            (
                "Meadow".to_string(),
                names(&[
                    "Rusty Nail",
                    "Bottle Cap",
                    "Old Boot",
                    "Coin Pouch",
                    "Silver Ring",
                    "Gold Nugget",
                    "Ancient Amulet",
                ]),
            ),
            (
                "Canyon".to_string(),
                names(&[
                    "Rusty Nail",
                    "Old Boot",
                    "Coin Pouch",
                    "Gold Nugget",
                    "Ancient Amulet",
                    "Fossil Skull",
                    "Dragon Egg",
                ]),
            ),
        ]);

        let detectors = BTreeMap::from([
            (
                "Basic Detector".to_string(),
                DetectorStats {
                    luck: 0.1,
                    search_radius: 30.0,
                },
            ),
            (
                "Pulse Detector".to_string(),
                DetectorStats {
                    luck: 0.2,
                    search_radius: 45.0,
                },
            ),
            (
                "Deep Seeker".to_string(),
                DetectorStats {
                    luck: 0.35,
                    search_radius: 60.0,
                },
            ),
        ]);

        let shovels = BTreeMap::from([
            (
                "Wooden Shovel".to_string(),
                ShovelStats {
                    strength_multiplier: 1.0,
                },
            ),
            (
                "Iron Shovel".to_string(),
                ShovelStats {
                    strength_multiplier: 2.0,
                },
            ),
            (
                "Gilded Spade".to_string(),
                ShovelStats {
                    strength_multiplier: 3.5,
                },
            ),
        ]);

        Self {
            maps,
            candidates,
            detectors,
            shovels,
        }
    }
}

impl LootTables {
    pub fn detector(&self, name: &str) -> Option<&DetectorStats> {
        self.detectors.get(name)
    }

    pub fn shovel(&self, name: &str) -> Option<&ShovelStats> {
        self.shovels.get(name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, c) in &self.candidates {
            if !(c.rarity.is_finite() && c.rarity > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "candidate '{name}' has non-positive rarity {}",
                    c.rarity
                )));
            }
            if !(c.min_weight >= 0.0 && c.max_weight >= c.min_weight) {
                return Err(ConfigError::Invalid(format!(
                    "candidate '{name}' has invalid weight range {}..{}",
                    c.min_weight, c.max_weight
                )));
            }
            if let RewardKind::Currency { per_weight } = c.reward {
                if per_weight < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "candidate '{name}' pays negative currency"
                    )));
                }
            }
        }
        for (map, allowed) in &self.maps {
            if let Some(unknown) = allowed.iter().find(|n| !self.candidates.contains_key(*n)) {
                return Err(ConfigError::Invalid(format!(
                    "map '{map}' references unknown candidate '{unknown}'"
                )));
            }
        }
        for (name, d) in &self.detectors {
            if d.luck < 0.0 || d.search_radius <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "detector '{name}' needs luck >= 0 and a positive search radius"
                )));
            }
        }
        for (name, s) in &self.shovels {
            if s.strength_multiplier < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "shovel '{name}' has negative strength multiplier"
                )));
            }
        }
        Ok(())
    }
}
