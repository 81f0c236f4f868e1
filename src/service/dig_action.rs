use tracing::{debug, info, warn};

use super::{DigOutcome, DigService, RejectReason};
use crate::dig::{DigProgress, ResolveReason, Target, TargetId, TargetSpec};
use crate::loot::{CandidatePool, LootSelector};
use crate::luck::{combine_luck, LuckInputs};
use crate::notify::{Notification, Recipient};
use crate::player::{PlayerId, Profile};

impl DigService {
    /// One "apply a dig" signal from the owner.
    ///
    /// With no active target this takes the "dig anywhere" path instead.
    pub fn dig(&mut self, player: PlayerId, now: f64) -> DigOutcome {
        let Some(session) = self.sessions.get(&player) else {
            return DigOutcome::Rejected(RejectReason::UnknownPlayer);
        };
        if session.dig_cooldown.is_active(now) {
            return DigOutcome::Rejected(RejectReason::Cooldown);
        }
        if !self.registry.contains(player) {
            return self.dig_anywhere(player, now);
        }

        let cooldown = self.config.dig_cooldown_secs;
        if let Some(session) = self.sessions.get_mut(&player) {
            session.dig_cooldown.arm(now, cooldown);
        }

        let Some(position) = self.collab.world.player_position(player) else {
            return DigOutcome::Rejected(RejectReason::NoPosition);
        };
        let Some(target) = self.registry.get(player) else {
            return DigOutcome::Rejected(RejectReason::NoTarget);
        };
        let distance = target.distance_to(position);
        let digging = target.actively_digging;

        if distance > self.config.anti_cheat_range() {
            warn!(%player, distance, "dig rejected, owner too far from target");
            self.resolve(player, ResolveReason::DistanceViolation, now);
            return DigOutcome::Failed(ResolveReason::DistanceViolation);
        }
        if !digging {
            if distance >= self.config.dig_range {
                return DigOutcome::Rejected(RejectReason::NotInRange);
            }
            self.enter_digging(player);
        }

        let Some(profile) = self.collab.profiles.get_profile(player) else {
            return DigOutcome::Rejected(RejectReason::ProfileNotLoaded);
        };
        let strength = self.effective_strength(player, &profile);

        let Some(target) = self.registry.get_mut(player) else {
            return DigOutcome::Rejected(RejectReason::NoTarget);
        };
        match target.apply_dig(strength) {
            DigProgress::Completed => {
                let rewards = self
                    .resolve(player, ResolveReason::Success, now)
                    .map(|r| r.rewards)
                    .unwrap_or_default();
                DigOutcome::Succeeded { rewards }
            }
            DigProgress::Progressed { progress } => {
                let (target_id, max_progress) = (target.id, target.max_progress);
                self.collab.notifier.send(
                    Recipient::AllExcept(player),
                    Notification::ProgressReplicated {
                        owner: player,
                        target_id,
                        progress,
                        max_progress,
                    },
                );
                debug!(%player, progress, max_progress, strength, "dig applied");
                DigOutcome::Progressed {
                    progress,
                    max_progress,
                }
            }
        }
    }

    /// baseStrength + shovel multiplier * base shovel strength, doubled by the perk
    pub fn effective_strength(&self, player: PlayerId, profile: &Profile) -> f64 {
        let multiplier = self
            .config
            .tables
            .shovel(&profile.shovel)
            .map_or(1.0, |shovel| shovel.strength_multiplier);
        let strength = profile.strength + multiplier * self.config.base_shovel_strength;
        if self
            .collab
            .entitlements
            .owns_entitlement(player, &self.config.double_strength_entitlement)
        {
            strength * 2.0
        } else {
            strength
        }
    }

    /// Synthesize a trash-pool target at the owner's feet and start digging it
    fn dig_anywhere(&mut self, player: PlayerId, now: f64) -> DigOutcome {
        let Some(session) = self.sessions.get(&player) else {
            return DigOutcome::Rejected(RejectReason::UnknownPlayer);
        };
        if session.success_cooldown.is_active(now) {
            return DigOutcome::Rejected(RejectReason::FallbackCooldown);
        }
        if session.is_rolling() || self.spawns.is_pending(player) {
            return DigOutcome::Rejected(RejectReason::NoTarget);
        }

        let Some(profile) = self.collab.profiles.get_profile(player) else {
            return DigOutcome::Rejected(RejectReason::ProfileNotLoaded);
        };
        let Some(origin) = self.collab.world.player_position(player) else {
            return DigOutcome::Rejected(RejectReason::NoPosition);
        };

        let luck = combine_luck(LuckInputs {
            detector_luck: 1.0,
            skill_luck: profile.luck,
            server_multiplier: self.collab.entitlements.server_luck_multiplier(player),
            potion_multiplier: profile.luck_potion_multiplier,
            roll_value: 1.0,
        });
        let Some(roll) = LootSelector::new(&self.config.tables).roll(
            &profile.current_map,
            CandidatePool::Trash,
            luck,
            &mut self.rng,
        ) else {
            return DigOutcome::Rejected(RejectReason::NoCandidate);
        };
        let Some(position) = self
            .collab
            .world
            .find_dig_position(origin, self.config.fallback_search_radius)
        else {
            return DigOutcome::Rejected(RejectReason::NoDigSite);
        };

        let cooldown = self.config.dig_cooldown_secs;
        if let Some(session) = self.sessions.get_mut(&player) {
            session.dig_cooldown.arm(now, cooldown);
        }

        let max_progress = self.config.max_progress_for(roll.weight);
        let target = Target::new(TargetSpec {
            id: TargetId::generate(&mut self.rng),
            owner: player,
            roll,
            position,
            map_name: profile.current_map,
            used_luck_mult: luck,
            using_dig_everywhere: true,
            max_progress,
            spawned_at: now,
        });
        let Ok(spawned) = self.registry.spawn(target) else {
            return DigOutcome::Rejected(RejectReason::NoTarget);
        };
        let (target_id, item_name) = (spawned.id, spawned.item_name.clone());
        self.collab.notifier.send(
            Recipient::Player(player),
            Notification::TargetSpawned {
                target_id,
                item_name: item_name.clone(),
                position,
                dig_everywhere: true,
            },
        );
        info!(%player, item = %item_name, luck, "dig anywhere target spawned");

        self.enter_digging(player);
        DigOutcome::FallbackStarted { target_id }
    }
}
