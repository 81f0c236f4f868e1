use std::fmt;

use bevy::math::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DigPhase;
use crate::constants::STARTING_PROGRESS_DIVISOR;
use crate::loot::{CandidatePool, LootRoll, RewardKind};
use crate::player::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub Uuid);

impl TargetId {
    /// Random v4 id drawn from the service RNG (reproducible under a fixed seed)
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(uuid::Builder::from_random_bytes(rng.gen()).into_uuid())
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything needed to place a freshly rolled target
#[derive(Debug, Clone)]
pub struct TargetSpec {
    pub id: TargetId,
    pub owner: PlayerId,
    pub roll: LootRoll,
    pub position: Vec3,
    pub map_name: String,
    pub used_luck_mult: f64,
    pub using_dig_everywhere: bool,
    pub max_progress: f64,
    pub spawned_at: f64,
}

/// Result of applying one dig action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DigProgress {
    Progressed { progress: f64 },
    Completed,
}

/// One spawned, ownable loot instance
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub id: TargetId,
    pub item_name: String,
    pub owner: PlayerId,
    pub position: Vec3,
    pub weight: f64,
    pub reward: RewardKind,
    dig_progress: f64,
    pub max_progress: f64,
    pub actively_digging: bool,
    pub used_luck_mult: f64,
    pub map_name: String,
    pub using_dig_everywhere: bool,
    pub spawned_at: f64,
}

impl Target {
    pub fn new(spec: TargetSpec) -> Self {
        let max_progress = spec.max_progress.max(f64::EPSILON);
        Self {
            id: spec.id,
            item_name: spec.roll.name,
            owner: spec.owner,
            position: spec.position,
            weight: spec.roll.weight,
            reward: spec.roll.reward,
            dig_progress: max_progress / STARTING_PROGRESS_DIVISOR,
            max_progress,
            actively_digging: false,
            used_luck_mult: spec.used_luck_mult,
            map_name: spec.map_name,
            using_dig_everywhere: spec.using_dig_everywhere,
            spawned_at: spec.spawned_at,
        }
    }

    pub fn dig_progress(&self) -> f64 {
        self.dig_progress
    }

    pub fn phase(&self) -> DigPhase {
        if self.actively_digging {
            DigPhase::Digging
        } else {
            DigPhase::Idle
        }
    }

    /// Pool bonus rolls for this target draw from
    pub fn pool(&self) -> CandidatePool {
        if self.using_dig_everywhere {
            CandidatePool::Trash
        } else {
            CandidatePool::Treasure
        }
    }

    /// Decay progress by `max_progress * rate * dt`.
    ///
    /// Only active digs decay. Returns true when progress hit zero.
    pub fn decay(&mut self, rate_per_second: f64, dt: f64) -> bool {
        if !self.actively_digging {
            return false;
        }
        let loss = self.max_progress * rate_per_second * dt.max(0.0);
        self.dig_progress = (self.dig_progress - loss).max(0.0);
        self.dig_progress <= 0.0
    }

    /// Add one dig's worth of strength, clamped at max_progress
    pub fn apply_dig(&mut self, strength: f64) -> DigProgress {
        self.dig_progress = (self.dig_progress + strength.max(0.0)).min(self.max_progress);
        if self.dig_progress >= self.max_progress {
            DigProgress::Completed
        } else {
            DigProgress::Progressed {
                progress: self.dig_progress,
            }
        }
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

#[cfg(test)]
pub(crate) fn test_target(owner: PlayerId, max_progress: f64) -> Target {
    Target::new(TargetSpec {
        id: TargetId(Uuid::nil()),
        owner,
        roll: LootRoll {
            name: "Gold Nugget".into(),
            weight: 1.0,
            reward: RewardKind::Item,
        },
        position: Vec3::ZERO,
        map_name: "Meadow".into(),
        used_luck_mult: 0.5,
        using_dig_everywhere: false,
        max_progress,
        spawned_at: 0.0,
    })
}
