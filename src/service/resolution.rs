use tracing::{debug, info, warn};

use super::DigService;
use crate::collab::GrantedItem;
use crate::dig::{ResolveReason, Target, TargetId};
use crate::loot::{LootRoll, LootSelector, RewardKind};
use crate::notify::{GrantedReward, Notification, Recipient};
use crate::player::{PlayerId, Tool};

/// A target that left the registry, and what it paid out
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target: Target,
    pub reason: ResolveReason,
    pub rewards: Vec<GrantedReward>,
}

impl DigService {
    /// Remove the owner's target and apply every side effect of its outcome.
    ///
    /// `None` when the owner had no target (stale input).
    pub(super) fn resolve(
        &mut self,
        owner: PlayerId,
        reason: ResolveReason,
        now: f64,
    ) -> Option<Resolution> {
        let target = self.registry.remove(owner)?;

        let rewards = if reason.is_success() {
            self.grant_success(&target)
        } else {
            Vec::new()
        };

        if let Some(profile) = self.collab.profiles.get_profile(owner) {
            let updated = if reason.is_success() {
                profile.with_success()
            } else {
                profile.with_failure()
            };
            if updated != profile {
                self.collab.profiles.set_profile(owner, updated);
            }
        }

        if target.actively_digging {
            self.collab.world.set_movement_locked(owner, false);
        }

        let success_cooldown = self.config.success_cooldown_secs;
        if let Some(session) = self.sessions.get_mut(&owner) {
            if target.actively_digging {
                let restored = self
                    .collab
                    .profiles
                    .get_profile(owner)
                    .map_or(Tool::Empty, |p| p.starting_tool());
                session.holding = restored;
                self.collab.world.show_tool(owner, restored);
            }
            if reason.is_success() {
                session.success_cooldown.arm(now, success_cooldown);
            }
            session.nearby = false;
            session.waypoint.reset();
        }

        self.collab.notifier.send(
            Recipient::All,
            Notification::TargetResolved {
                owner,
                target_id: target.id,
                item_name: target.item_name.clone(),
                reason,
                rewards: rewards.clone(),
            },
        );

        if reason.is_success() {
            info!(
                %owner,
                item = %target.item_name,
                weight = target.weight,
                granted = rewards.len(),
                "dig succeeded"
            );
        } else {
            info!(%owner, item = %target.item_name, ?reason, "dig failed");
        }

        Some(Resolution {
            target,
            reason,
            rewards,
        })
    }

    /// Transition the owner's target to Digging; no-op when already digging
    pub(super) fn enter_digging(&mut self, owner: PlayerId) -> bool {
        let Some(target) = self.registry.get_mut(owner) else {
            return false;
        };
        if target.actively_digging {
            return false;
        }
        target.actively_digging = true;
        let (target_id, progress, max_progress) =
            (target.id, target.dig_progress(), target.max_progress);

        self.collab.world.set_movement_locked(owner, true);
        self.collab.world.show_tool(owner, Tool::Shovel);
        if let Some(session) = self.sessions.get_mut(&owner) {
            session.holding = Tool::Shovel;
            session.roll = None;
            session.nearby = false;
        }
        self.collab.notifier.send(
            Recipient::Player(owner),
            Notification::DiggingStarted {
                target_id,
                progress,
                max_progress,
            },
        );
        debug!(%owner, %target_id, progress, max_progress, "digging started");
        true
    }

    /// Primary instance plus `multi_dig_level` bonus rolls
    fn grant_success(&mut self, target: &Target) -> Vec<GrantedReward> {
        let owner = target.owner;
        let primary = LootRoll {
            name: target.item_name.clone(),
            weight: target.weight,
            reward: target.reward,
        };
        let mut rewards = self.grant_instance(owner, target.id, &primary, &target.map_name);

        let bonus_rolls = self
            .collab
            .profiles
            .get_profile(owner)
            .map_or(0, |p| p.multi_dig_level);
        for _ in 0..bonus_rolls {
            let Some(roll) = LootSelector::new(&self.config.tables).roll(
                &target.map_name,
                target.pool(),
                target.used_luck_mult,
                &mut self.rng,
            ) else {
                debug!(%owner, "bonus roll found no candidate");
                continue;
            };
            let id = TargetId::generate(&mut self.rng);
            debug!(%owner, item = %roll.name, weight = roll.weight, "bonus roll");
            rewards.extend(self.grant_instance(owner, id, &roll, &target.map_name));
        }
        rewards
    }

    fn grant_instance(
        &self,
        owner: PlayerId,
        id: TargetId,
        roll: &LootRoll,
        map_name: &str,
    ) -> Vec<GrantedReward> {
        let mut granted = Vec::with_capacity(2);

        match roll.reward {
            RewardKind::Item => {
                let item = GrantedItem {
                    id,
                    name: roll.name.clone(),
                    weight: roll.weight,
                    map_name: map_name.to_string(),
                };
                match self.collab.inventory.add_item(owner, &item) {
                    Ok(()) => granted.push(GrantedReward::Item {
                        name: item.name,
                        weight: item.weight,
                    }),
                    Err(e) => {
                        warn!(%owner, item = %roll.name, "item not granted: {e}");
                        return granted;
                    }
                }
            }
            RewardKind::Currency { per_weight } => {
                let amount = (roll.weight * per_weight).round().max(0.0) as u64;
                if amount > 0 {
                    self.collab.economy.give_currency(owner, amount);
                    granted.push(GrantedReward::Currency {
                        name: roll.name.clone(),
                        amount,
                    });
                }
            }
        }

        let experience = (roll.weight * self.config.experience_per_weight)
            .round()
            .max(0.0) as u64;
        if experience > 0 {
            self.collab.leveling.add_experience(owner, experience);
            granted.push(GrantedReward::Experience { amount: experience });
        }
        granted
    }
}
