//! Dig service: the session orchestrator and service boundary.
//!
//! Owns the target registry, one `PlayerSession` per connected player and
//! the spawn scheduler. All inbound messages and both tick phases run on the
//! same thread; callers pass the server clock explicitly.
//!
//! Tick phases:
//!   1. `tick_rolls` - advance every in-flight luck roll
//!   2. `tick`       - spawn retries, decay/timeouts, proximity scan

mod dig_action;
mod resolution;
mod session;
mod tick;

pub use resolution::Resolution;
pub use session::PlayerSession;

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, info, warn};

use crate::collab::Collaborators;
use crate::config::DigConfig;
use crate::dig::{DigPhase, ResolveReason, Target, TargetId, TargetRegistry};
use crate::loot::CandidatePool;
use crate::luck::{combine_luck, LuckInputs, LuckRoll};
use crate::notify::GrantedReward;
use crate::player::{PlayerId, Profile, Tool};
use crate::spawn::{PendingSpawn, SpawnScheduler};

/// Why a dig action changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownPlayer,
    Cooldown,
    FallbackCooldown,
    NoTarget,
    ProfileNotLoaded,
    NoPosition,
    NotInRange,
    NoCandidate,
    NoDigSite,
}

/// Result of one dig action
#[derive(Debug, Clone, PartialEq)]
pub enum DigOutcome {
    Rejected(RejectReason),
    Progressed { progress: f64, max_progress: f64 },
    Succeeded { rewards: Vec<GrantedReward> },
    Failed(ResolveReason),
    FallbackStarted { target_id: TargetId },
}

pub struct DigService {
    config: DigConfig,
    collab: Collaborators,
    registry: TargetRegistry,
    sessions: BTreeMap<PlayerId, PlayerSession>,
    spawns: SpawnScheduler,
    rng: Xoshiro256PlusPlus,
}

impl DigService {
    pub fn new(config: DigConfig, collab: Collaborators) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        let spawns = SpawnScheduler::new(
            config.spawn_max_attempts,
            config.spawn_retry_base_secs,
            config.spawn_retry_max_secs,
        );
        Self {
            config,
            collab,
            registry: TargetRegistry::new(),
            sessions: BTreeMap::new(),
            spawns,
            rng,
        }
    }

    // =====================================================
    // Connection lifecycle
    // =====================================================

    pub fn connect(&mut self, player: PlayerId) {
        let holding = self
            .collab
            .profiles
            .get_profile(player)
            .map_or(Tool::Empty, |p| p.starting_tool());
        self.sessions.entry(player).or_insert_with(|| {
            info!(%player, ?holding, "player session opened");
            PlayerSession::new(holding)
        });
    }

    /// Tear down everything the player had in flight
    pub fn disconnect(&mut self, player: PlayerId, now: f64) {
        self.cancel_in_flight(player);
        if self.registry.contains(player) {
            self.resolve(player, ResolveReason::Disconnected, now);
        }
        if self.sessions.remove(&player).is_some() {
            info!(%player, "player session closed");
        }
    }

    pub fn zone_changed(&mut self, player: PlayerId, new_map: &str, now: f64) {
        self.cancel_in_flight(player);
        if self.registry.contains(player) {
            self.resolve(player, ResolveReason::ZoneChanged, now);
        }
        debug!(%player, map = new_map, "zone changed");
    }

    /// Switch the held tool; refused while digging (the shovel is locked in)
    pub fn equip(&mut self, player: PlayerId, tool: Tool) -> bool {
        if self.registry.get(player).is_some_and(|t| t.actively_digging) {
            return false;
        }
        if tool == Tool::Detector
            && self
                .collab
                .profiles
                .get_profile(player)
                .is_none_or(|p| p.detector.is_none())
        {
            return false;
        }
        let Some(session) = self.sessions.get_mut(&player) else {
            return false;
        };
        if tool != Tool::Detector {
            session.roll = None;
        }
        session.holding = tool;
        self.collab.world.show_tool(player, tool);
        true
    }

    fn cancel_in_flight(&mut self, player: PlayerId) {
        if let Some(session) = self.sessions.get_mut(&player) {
            session.roll = None;
        }
        self.spawns.cancel(player);
    }

    // =====================================================
    // Luck roll
    // =====================================================

    pub fn begin_roll(&mut self, player: PlayerId, now: f64) -> bool {
        if self.registry.contains(player) || self.spawns.is_pending(player) {
            return false;
        }
        if self.collab.profiles.get_profile(player).is_none() {
            debug!(%player, "roll ignored, profile not loaded");
            return false;
        }
        let Some(session) = self.sessions.get_mut(&player) else {
            return false;
        };
        if session.holding != Tool::Detector || session.is_rolling() {
            return false;
        }
        session.roll = Some(LuckRoll::begin(now));
        debug!(%player, "luck roll started");
        true
    }

    /// Tick phase (a): advance every in-flight roll
    pub fn tick_rolls(&mut self, now: f64) {
        for roll in self.sessions.values_mut().filter_map(|s| s.roll.as_mut()) {
            roll.tick(now);
        }
    }

    /// Release the roll and try to spawn a target with its value.
    ///
    /// Returns the roll value, or `None` when no roll was in flight.
    pub fn end_roll(&mut self, player: PlayerId, now: f64) -> Option<f64> {
        let session = self.sessions.get_mut(&player)?;
        let roll = session.roll.take()?;
        let value = roll.value();
        session.last_roll_value = Some(value);

        if self.registry.contains(player) || self.spawns.is_pending(player) {
            debug!(%player, "roll released while a target is active");
            return Some(value);
        }

        if let Some(pending) = self.detector_spawn(player, value, now) {
            self.attempt_spawn(pending, now);
        }
        Some(value)
    }

    fn detector_spawn(
        &self,
        player: PlayerId,
        roll_value: f64,
        now: f64,
    ) -> Option<PendingSpawn> {
        let Some(profile) = self.collab.profiles.get_profile(player) else {
            debug!(%player, "spawn skipped, profile not loaded");
            return None;
        };
        let Some(detector) = profile
            .detector
            .as_deref()
            .and_then(|name| self.config.tables.detector(name))
        else {
            warn!(%player, detector = ?profile.detector, "spawn skipped, unknown detector");
            return None;
        };

        let luck = self.spawn_luck(player, &profile, detector.luck, roll_value);
        debug!(%player, roll_value, luck, "roll released");
        Some(PendingSpawn {
            player,
            luck,
            pool: CandidatePool::Treasure,
            search_radius: self.config.spawn_search_radius.min(detector.search_radius),
            attempt: 1,
            due_at: now,
        })
    }

    /// Combined luck for a spawn, clamped into [0, 1]
    fn spawn_luck(
        &self,
        player: PlayerId,
        profile: &Profile,
        detector_luck: f64,
        roll_value: f64,
    ) -> f64 {
        combine_luck(LuckInputs {
            detector_luck,
            skill_luck: profile.luck,
            server_multiplier: self.collab.entitlements.server_luck_multiplier(player),
            potion_multiplier: profile.luck_potion_multiplier,
            roll_value,
        })
    }

    // =====================================================
    // Queries
    // =====================================================

    pub fn config(&self) -> &DigConfig {
        &self.config
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn target_of(&self, player: PlayerId) -> Option<&Target> {
        self.registry.get(player)
    }

    pub fn phase_of(&self, player: PlayerId) -> DigPhase {
        self.registry
            .get(player)
            .map_or(DigPhase::NoTarget, Target::phase)
    }

    pub fn session(&self, player: PlayerId) -> Option<&PlayerSession> {
        self.sessions.get(&player)
    }

    pub fn is_connected(&self, player: PlayerId) -> bool {
        self.sessions.contains_key(&player)
    }

    pub fn is_rolling(&self, player: PlayerId) -> bool {
        self.sessions.get(&player).is_some_and(PlayerSession::is_rolling)
    }

    /// Latest oscillator sample of the in-flight roll
    pub fn current_roll_value(&self, player: PlayerId) -> Option<f64> {
        self.sessions
            .get(&player)
            .and_then(|s| s.roll.as_ref())
            .and_then(LuckRoll::computed)
    }

    pub fn last_roll_value(&self, player: PlayerId) -> Option<f64> {
        self.sessions.get(&player).and_then(|s| s.last_roll_value)
    }

    pub fn is_nearby(&self, player: PlayerId) -> bool {
        self.sessions.get(&player).is_some_and(|s| s.nearby)
    }

    pub fn holding(&self, player: PlayerId) -> Option<Tool> {
        self.sessions.get(&player).map(|s| s.holding)
    }

    pub fn is_spawn_pending(&self, player: PlayerId) -> bool {
        self.spawns.is_pending(player)
    }
}
