use tracing::{debug, info, warn};

use super::DigService;
use crate::dig::{ResolveReason, Target, TargetId, TargetSpec};
use crate::logging::TimingSpan;
use crate::loot::LootSelector;
use crate::notify::{Notification, Recipient};
use crate::player::{PlayerId, Tool};
use crate::proximity::{classify, waypoint_direction, Proximity};
use crate::spawn::{PendingSpawn, RetryDecision};

/// Reason a spawn attempt produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpawnMiss {
    ProfileNotLoaded,
    NoPosition,
    NoCandidate,
    NoDigSite,
    /// Owner already has a target; never retried
    AlreadyOwned,
}

impl DigService {
    /// Tick phase (b): spawn retries, decay and timeouts, proximity scan
    pub fn tick(&mut self, now: f64, dt: f64) {
        let _span = TimingSpan::new("dig_tick");

        for pending in self.spawns.take_due(now) {
            self.attempt_spawn(pending, now);
        }
        self.decay_phase(now, dt);
        self.proximity_phase(now);
    }

    pub(super) fn attempt_spawn(&mut self, pending: PendingSpawn, now: f64) {
        let player = pending.player;
        if !self.sessions.contains_key(&player) {
            return;
        }
        match self.try_spawn(&pending, now) {
            Ok(_) | Err(SpawnMiss::AlreadyOwned) => {}
            Err(miss) => match self.spawns.retry(pending, now) {
                RetryDecision::Rescheduled { attempt, due_at } => {
                    debug!(%player, ?miss, attempt, due_at, "spawn missed, retrying");
                }
                RetryDecision::Exhausted { attempts } => {
                    warn!(%player, ?miss, attempts, "spawn abandoned");
                }
            },
        }
    }

    fn try_spawn(&mut self, pending: &PendingSpawn, now: f64) -> Result<TargetId, SpawnMiss> {
        let player = pending.player;
        if self.registry.contains(player) {
            return Err(SpawnMiss::AlreadyOwned);
        }
        let profile = self
            .collab
            .profiles
            .get_profile(player)
            .ok_or(SpawnMiss::ProfileNotLoaded)?;
        let origin = self
            .collab
            .world
            .player_position(player)
            .ok_or(SpawnMiss::NoPosition)?;
        let roll = LootSelector::new(&self.config.tables)
            .roll(&profile.current_map, pending.pool, pending.luck, &mut self.rng)
            .ok_or(SpawnMiss::NoCandidate)?;
        let position = self
            .collab
            .world
            .find_dig_position(origin, pending.search_radius)
            .ok_or(SpawnMiss::NoDigSite)?;

        let max_progress = self.config.max_progress_for(roll.weight);
        let target = Target::new(TargetSpec {
            id: TargetId::generate(&mut self.rng),
            owner: player,
            roll,
            position,
            map_name: profile.current_map,
            used_luck_mult: pending.luck,
            using_dig_everywhere: false,
            max_progress,
            spawned_at: now,
        });
        let spawned = self
            .registry
            .spawn(target)
            .map_err(|_| SpawnMiss::AlreadyOwned)?;

        info!(
            %player,
            item = %spawned.item_name,
            weight = spawned.weight,
            luck = spawned.used_luck_mult,
            "target spawned"
        );
        let target_id = spawned.id;
        self.collab.notifier.send(
            Recipient::Player(player),
            Notification::TargetSpawned {
                target_id,
                item_name: spawned.item_name.clone(),
                position: spawned.position,
                dig_everywhere: false,
            },
        );
        Ok(target_id)
    }

    fn decay_phase(&mut self, now: f64, dt: f64) {
        let rate = self.config.decay_rate_per_second;
        let lifetime = self.config.target_lifetime_secs;

        for owner in self.registry.owners() {
            let Some(target) = self.registry.get_mut(owner) else {
                continue;
            };
            let verdict = if target.actively_digging {
                target.decay(rate, dt).then_some(ResolveReason::Decayed)
            } else if now - target.spawned_at >= lifetime {
                Some(ResolveReason::Timeout)
            } else {
                None
            };
            if let Some(reason) = verdict {
                self.resolve(owner, reason, now);
            }
        }
    }

    fn proximity_phase(&mut self, now: f64) {
        let dig_range = self.config.dig_range;
        let watchdog_range = self.config.anti_cheat_range();
        let interval = self.config.waypoint_interval_secs;
        let min_displacement = self.config.waypoint_min_displacement;

        for owner in self.registry.owners() {
            let Some(target) = self.registry.get(owner) else {
                continue;
            };
            let Some(position) = self.collab.world.player_position(owner) else {
                continue;
            };
            let distance = target.distance_to(position);
            let (target_id, target_position, digging) =
                (target.id, target.position, target.actively_digging);

            if digging {
                if distance > watchdog_range {
                    warn!(%owner, distance, "owner left the dig site while digging");
                    self.resolve(owner, ResolveReason::DistanceViolation, now);
                }
                continue;
            }

            let Some(search_radius) = self.equipped_detector_radius(owner) else {
                continue;
            };
            match classify(distance, dig_range, search_radius) {
                Proximity::InDigRange => {
                    self.enter_digging(owner);
                }
                Proximity::Nearby => {
                    let Some(session) = self.sessions.get_mut(&owner) else {
                        continue;
                    };
                    session.nearby = true;
                    if session
                        .waypoint
                        .should_notify(now, position, interval, min_displacement)
                    {
                        self.collab.notifier.send(
                            Recipient::Player(owner),
                            Notification::WaypointUpdate {
                                target_id,
                                direction: waypoint_direction(position, target_position),
                                distance,
                            },
                        );
                    }
                }
                Proximity::Far => {
                    if let Some(session) = self.sessions.get_mut(&owner) {
                        session.nearby = false;
                    }
                }
            }
        }
    }

    /// Search radius of the detector the owner is holding, if any
    fn equipped_detector_radius(&self, owner: PlayerId) -> Option<f32> {
        let session = self.sessions.get(&owner)?;
        if session.holding != Tool::Detector {
            return None;
        }
        let profile = self.collab.profiles.get_profile(owner)?;
        let name = profile.detector?;
        self.config
            .tables
            .detector(&name)
            .map(|detector| detector.search_radius)
    }
}
