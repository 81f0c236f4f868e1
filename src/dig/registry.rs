use std::collections::BTreeMap;

use super::{Target, TargetId};
use crate::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnRejected {
    #[error("{owner} already owns target {existing}")]
    OwnerHasTarget { owner: PlayerId, existing: TargetId },
}

/// Authoritative set of active targets, one per owner
#[derive(Debug, Default)]
pub struct TargetRegistry {
    by_owner: BTreeMap<PlayerId, Target>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a target; rejected if its owner already has one
    pub fn spawn(&mut self, target: Target) -> Result<&Target, SpawnRejected> {
        if let Some(existing) = self.by_owner.get(&target.owner) {
            return Err(SpawnRejected::OwnerHasTarget {
                owner: target.owner,
                existing: existing.id,
            });
        }
        let owner = target.owner;
        Ok(self.by_owner.entry(owner).or_insert(target))
    }

    pub fn get(&self, owner: PlayerId) -> Option<&Target> {
        self.by_owner.get(&owner)
    }

    pub fn get_mut(&mut self, owner: PlayerId) -> Option<&mut Target> {
        self.by_owner.get_mut(&owner)
    }

    pub fn contains(&self, owner: PlayerId) -> bool {
        self.by_owner.contains_key(&owner)
    }

    pub fn remove(&mut self, owner: PlayerId) -> Option<Target> {
        self.by_owner.remove(&owner)
    }

    /// Owner snapshot for mutate-while-scanning loops
    pub fn owners(&self) -> Vec<PlayerId> {
        self.by_owner.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }
}
