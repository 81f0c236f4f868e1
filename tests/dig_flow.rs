//! End-to-end dig session scenarios against in-memory collaborators.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::math::Vec3;

use dig_core::collab::{Collaborators, MemoryBackend};
use dig_core::dig::{DigPhase, ResolveReason};
use dig_core::loot::{Candidate, CandidatePool, LootTables, RewardKind};
use dig_core::notify::{GrantedReward, Notification, Recipient};
use dig_core::player::{PlayerId, Profile, Tool};
use dig_core::simulation::{simulate_selection, SelectionSim};
use dig_core::{DigConfig, DigOutcome, DigService, RejectReason};

const P: PlayerId = PlayerId(1);
const PEAK: f64 = 2.0 / 3.0;
const TICK: f64 = 1.0 / 30.0;

fn candidate(rarity: f64, weight: f64, trash: bool) -> Candidate {
    Candidate {
        rarity,
        min_weight: weight,
        max_weight: weight,
        trash,
        reward: RewardKind::Item,
    }
}

/// "Forge" only ever drops a weight-4 anvil: max_progress = 40 + 4 * 15 = 100
fn forge_tables() -> LootTables {
    let mut tables = LootTables::default();
    tables
        .candidates
        .insert("Anvil".into(), candidate(1.0, 4.0, true));
    tables.maps.insert("Forge".into(), vec!["Anvil".into()]);
    tables
}

fn forge_profile() -> Profile {
    Profile {
        current_map: "Forge".into(),
        ..Profile::default()
    }
}

fn service_with(tables: LootTables, profile: Profile) -> (DigService, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_player(P, profile, Vec3::ZERO);
    let config = DigConfig {
        rng_seed: Some(7),
        tables,
        ..DigConfig::default()
    };
    let mut service = DigService::new(config, Collaborators::in_memory(backend.clone()));
    service.connect(P);
    (service, backend)
}

fn forge() -> (DigService, Arc<MemoryBackend>) {
    service_with(forge_tables(), forge_profile())
}

/// Roll held for one peak of the oscillator, then released
fn roll_and_release(service: &mut DigService, now: f64) -> f64 {
    assert!(service.begin_roll(P, now));
    service.tick_rolls(now + PEAK);
    service.end_roll(P, now + PEAK).unwrap()
}

fn resolved_reasons(backend: &MemoryBackend) -> Vec<ResolveReason> {
    backend
        .notifications()
        .into_iter()
        .filter_map(|(_, n)| match n {
            Notification::TargetResolved { reason, .. } => Some(reason),
            _ => None,
        })
        .collect()
}

fn count_notifications(backend: &MemoryBackend, pred: impl Fn(&Notification) -> bool) -> usize {
    backend
        .notifications()
        .iter()
        .filter(|(_, n)| pred(n))
        .count()
}

// ============================================================
// Roll -> spawn
// ============================================================

#[test]
fn test_roll_at_peak_spawns_target_with_full_luck() {
    let (mut service, backend) = forge();
    let value = roll_and_release(&mut service, 0.0);
    assert_eq!(value, 10.0);

    let target = service.target_of(P).unwrap();
    // 0.1 detector luck * roll 10
    assert!((target.used_luck_mult - 1.0).abs() < 1e-12);
    assert_eq!(target.item_name, "Anvil");
    assert_eq!(target.max_progress, 100.0);
    assert!((target.dig_progress() - 100.0 / 3.0).abs() < 1e-9);
    // Basic detector radius 30, memory dig sites at half the radius
    assert_eq!(target.position, Vec3::new(15.0, 0.0, 0.0));
    assert_eq!(service.phase_of(P), DigPhase::Idle);

    let spawned = backend.notifications();
    assert!(matches!(
        spawned.as_slice(),
        [(Recipient::Player(P), Notification::TargetSpawned { dig_everywhere: false, .. })]
    ));
}

#[test]
fn test_release_before_first_tick_uses_default_roll() {
    let (mut service, _backend) = forge();
    assert!(service.begin_roll(P, 0.0));
    assert_eq!(service.end_roll(P, 0.1), Some(0.5));
    let target = service.target_of(P).unwrap();
    assert!((target.used_luck_mult - 0.05).abs() < 1e-12);
}

#[test]
fn test_extreme_luck_stacking_is_clamped() {
    let (mut service, backend) = forge();
    backend.set_server_luck(P, 1000.0);
    roll_and_release(&mut service, 0.0);
    assert_eq!(service.target_of(P).unwrap().used_luck_mult, 1.0);
}

#[test]
fn test_roll_preconditions() {
    let (mut service, backend) = forge();
    assert_eq!(service.end_roll(P, 0.0), None);

    roll_and_release(&mut service, 0.0);
    assert!(!service.begin_roll(P, 1.0), "target already active");

    let other = PlayerId(2);
    service.connect(other);
    assert!(!service.begin_roll(other, 1.0), "profile not loaded");

    backend.add_player(other, Profile::default(), Vec3::ZERO);
    service.connect(other);
    assert!(service.equip(other, Tool::Shovel));
    assert!(!service.begin_roll(other, 1.0), "not holding a detector");
}

#[test]
fn test_duplicate_release_is_noop() {
    let (mut service, _backend) = forge();
    roll_and_release(&mut service, 0.0);
    let first = service.target_of(P).unwrap().id;
    assert_eq!(service.end_roll(P, 1.0), None);
    assert_eq!(service.registry().len(), 1);
    assert_eq!(service.target_of(P).unwrap().id, first);
}

#[test]
fn test_end_to_end_flattened_selection() {
    let roll = dig_core::luck::roll_value(PEAK);
    assert_eq!(roll, 10.0);
    let luck = dig_core::luck::combine_luck(dig_core::luck::LuckInputs {
        detector_luck: 0.1,
        skill_luck: 1.0,
        server_multiplier: 1000.0,
        potion_multiplier: 1.0,
        roll_value: roll,
    });
    assert_eq!(luck, 1.0);

    let tables = LootTables {
        maps: BTreeMap::from([("Pair".to_string(), vec!["Common".into(), "Rare".into()])]),
        candidates: BTreeMap::from([
            ("Common".to_string(), candidate(10.0, 1.0, false)),
            ("Rare".to_string(), candidate(1000.0, 1.0, false)),
        ]),
        ..LootTables::default()
    };
    let report = simulate_selection(
        &tables,
        &SelectionSim {
            map_name: "Pair".into(),
            pool: CandidatePool::Treasure,
            luck,
            trials: 100_000,
            seed: 2024,
        },
    );
    // luck 1 flattens both selection weights to 1
    let rare = report.frequency("Rare");
    assert!((rare - 0.5).abs() < 0.01, "rare frequency {rare}");
}

// ============================================================
// Digging
// ============================================================

#[test]
fn test_walking_into_range_starts_digging() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));
    service.tick(1.0, TICK);

    assert_eq!(service.phase_of(P), DigPhase::Digging);
    assert!(backend.is_movement_locked(P));
    assert_eq!(backend.shown_tool(P), Some(Tool::Shovel));
    assert_eq!(service.holding(P), Some(Tool::Shovel));
    assert!(!service.equip(P, Tool::Detector), "tool is locked while digging");
    assert_eq!(
        count_notifications(&backend, |n| matches!(n, Notification::DiggingStarted { .. })),
        1
    );

    // idempotent
    service.tick(1.1, TICK);
    assert_eq!(
        count_notifications(&backend, |n| matches!(n, Notification::DiggingStarted { .. })),
        1
    );
}

#[test]
fn test_decay_over_two_seconds() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));
    service.tick(1.0, TICK);
    let start = service.target_of(P).unwrap().dig_progress();

    let mut now = 1.0;
    for _ in 0..60 {
        now += TICK;
        service.tick(now, TICK);
    }
    let progress = service.target_of(P).unwrap().dig_progress();
    assert!((start - progress - 10.0).abs() < 1e-9, "lost {}", start - progress);
}

#[test]
fn test_decay_to_zero_fails_dig() {
    let profile = Profile {
        dig_streak: 4,
        ..forge_profile()
    };
    let (mut service, backend) = service_with(forge_tables(), profile);
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));
    service.tick(1.0, TICK);
    service.tick(11.0, 10.0);

    assert_eq!(service.phase_of(P), DigPhase::NoTarget);
    assert_eq!(resolved_reasons(&backend), vec![ResolveReason::Decayed]);
    assert!(!backend.is_movement_locked(P));
    assert_eq!(service.holding(P), Some(Tool::Detector));
    assert_eq!(backend.profile(P).unwrap().dig_streak, 0);
}

#[test]
fn test_dig_completes_exactly_once() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));

    // strength 1 + 1.0 * 5 = 6; progress 33.3 -> 100 takes 12 digs
    let mut successes = Vec::new();
    let mut outcomes = Vec::new();
    for i in 0..20 {
        let outcome = service.dig(P, 1.0 + i as f64 * 0.25);
        if matches!(outcome, DigOutcome::Succeeded { .. }) {
            successes.push(i);
        }
        outcomes.push(outcome);
    }
    assert_eq!(successes, vec![11]);
    assert!(outcomes[12..]
        .iter()
        .all(|o| *o == DigOutcome::Rejected(RejectReason::FallbackCooldown)));
    assert_eq!(
        count_notifications(&backend, |n| matches!(n, Notification::ProgressReplicated { .. })),
        11
    );

    let DigOutcome::Succeeded { rewards } = &outcomes[11] else {
        unreachable!();
    };
    assert_eq!(
        rewards,
        &vec![
            GrantedReward::Item {
                name: "Anvil".into(),
                weight: 4.0
            },
            GrantedReward::Experience { amount: 40 },
        ]
    );
    assert_eq!(backend.inventory(P).len(), 1);
    assert_eq!(backend.experience(P), 40);
    let profile = backend.profile(P).unwrap();
    assert_eq!(profile.total_digs, 1);
    assert_eq!(profile.dig_streak, 1);
    assert!(!backend.is_movement_locked(P));
    assert_eq!(resolved_reasons(&backend), vec![ResolveReason::Success]);
}

#[test]
fn test_progress_is_replicated_to_observers_only() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));
    service.dig(P, 1.0);
    let replicated: Vec<_> = backend
        .notifications()
        .into_iter()
        .filter(|(_, n)| matches!(n, Notification::ProgressReplicated { .. }))
        .collect();
    assert_eq!(replicated.len(), 1);
    assert_eq!(replicated[0].0, Recipient::AllExcept(P));
}

#[test]
fn test_zero_elapsed_digs_apply_once() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));

    let first = service.dig(P, 2.0);
    let second = service.dig(P, 2.0);
    assert!(matches!(first, DigOutcome::Progressed { .. }));
    assert_eq!(second, DigOutcome::Rejected(RejectReason::Cooldown));
    let progress = service.target_of(P).unwrap().dig_progress();
    assert!((progress - (100.0 / 3.0 + 6.0)).abs() < 1e-9);
}

#[test]
fn test_remote_dig_forces_failure_without_progress() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));
    service.tick(1.0, TICK);
    assert_eq!(service.phase_of(P), DigPhase::Digging);

    // 13 units from the target, past 2 * dig range
    backend.set_position(P, Vec3::new(28.0, 0.0, 0.0));
    let outcome = service.dig(P, 1.5);
    assert_eq!(outcome, DigOutcome::Failed(ResolveReason::DistanceViolation));
    assert_eq!(service.phase_of(P), DigPhase::NoTarget);
    assert!(backend.inventory(P).is_empty());
    assert_eq!(
        count_notifications(&backend, |n| matches!(n, Notification::ProgressReplicated { .. })),
        0
    );
}

#[test]
fn test_dig_from_spawn_point_is_remote() {
    let (mut service, _backend) = forge();
    roll_and_release(&mut service, 0.0);
    // owner still at the origin, 15 units from the target
    assert_eq!(
        service.dig(P, 1.0),
        DigOutcome::Failed(ResolveReason::DistanceViolation)
    );
    assert!(service.target_of(P).is_none());
}

#[test]
fn test_dig_between_ranges_is_not_in_range() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(7.0, 0.0, 0.0));
    assert_eq!(
        service.dig(P, 1.0),
        DigOutcome::Rejected(RejectReason::NotInRange)
    );
    assert_eq!(service.phase_of(P), DigPhase::Idle);
}

#[test]
fn test_walking_away_while_digging_fails() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));
    service.tick(1.0, TICK);
    backend.set_position(P, Vec3::new(40.0, 0.0, 0.0));
    service.tick(1.1, TICK);
    assert_eq!(service.phase_of(P), DigPhase::NoTarget);
    assert_eq!(resolved_reasons(&backend), vec![ResolveReason::DistanceViolation]);
}

#[test]
fn test_idle_target_times_out() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    service.tick(100.0, TICK);
    assert_eq!(service.phase_of(P), DigPhase::Idle);
    service.tick(PEAK + 300.0, TICK);
    assert_eq!(service.phase_of(P), DigPhase::NoTarget);
    assert_eq!(resolved_reasons(&backend), vec![ResolveReason::Timeout]);
}

#[test]
fn test_double_strength_entitlement() {
    let (service, backend) = forge();
    let profile = forge_profile();
    assert_eq!(service.effective_strength(P, &profile), 6.0);
    backend.grant_entitlement(P, "double_strength");
    assert_eq!(service.effective_strength(P, &profile), 12.0);

    let iron = Profile {
        shovel: "Iron Shovel".into(),
        ..forge_profile()
    };
    assert_eq!(service.effective_strength(P, &iron), 24.0);
}

// ============================================================
// Rewards
// ============================================================

fn dig_to_completion(service: &mut DigService, backend: &MemoryBackend, start: f64) -> DigOutcome {
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));
    let mut now = start;
    loop {
        let outcome = service.dig(P, now);
        if !matches!(outcome, DigOutcome::Progressed { .. }) {
            return outcome;
        }
        now += 0.25;
    }
}

#[test]
fn test_multi_dig_grants_bonus_rolls() {
    let profile = Profile {
        multi_dig_level: 2,
        ..forge_profile()
    };
    let (mut service, backend) = service_with(forge_tables(), profile);
    roll_and_release(&mut service, 0.0);
    let outcome = dig_to_completion(&mut service, &backend, 1.0);

    let DigOutcome::Succeeded { rewards } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    let items = rewards
        .iter()
        .filter(|r| matches!(r, GrantedReward::Item { .. }))
        .count();
    assert_eq!(items, 3);
    assert_eq!(backend.inventory(P).len(), 3);
    assert_eq!(backend.experience(P), 120);
}

#[test]
fn test_full_inventory_withholds_experience() {
    let (mut service, backend) = forge();
    backend.set_inventory_capacity(0);
    roll_and_release(&mut service, 0.0);
    let outcome = dig_to_completion(&mut service, &backend, 1.0);

    assert_eq!(outcome, DigOutcome::Succeeded { rewards: vec![] });
    assert!(backend.inventory(P).is_empty());
    assert_eq!(backend.experience(P), 0);
    assert!(service.target_of(P).is_none());
}

#[test]
fn test_currency_reward_goes_to_economy() {
    let mut tables = LootTables::default();
    tables.candidates.insert(
        "Purse".into(),
        Candidate {
            reward: RewardKind::Currency { per_weight: 25.0 },
            ..candidate(1.0, 2.0, true)
        },
    );
    tables.maps.insert("Market".into(), vec!["Purse".into()]);
    let profile = Profile {
        current_map: "Market".into(),
        ..Profile::default()
    };
    let (mut service, backend) = service_with(tables, profile);
    roll_and_release(&mut service, 0.0);
    dig_to_completion(&mut service, &backend, 1.0);

    assert_eq!(backend.currency(P), 50);
    assert_eq!(backend.experience(P), 20);
    assert!(backend.inventory(P).is_empty());
}

// ============================================================
// Dig anywhere
// ============================================================

#[test]
fn test_dig_anywhere_spawns_trash_and_starts_digging() {
    let (mut service, backend) = service_with(LootTables::default(), Profile::default());
    let outcome = service.dig(P, 0.0);
    let DigOutcome::FallbackStarted { target_id } = outcome else {
        panic!("expected fallback, got {outcome:?}");
    };

    let target = service.target_of(P).unwrap();
    assert_eq!(target.id, target_id);
    assert!(target.using_dig_everywhere);
    assert_eq!(target.pool(), CandidatePool::Trash);
    assert!(service.config().tables.candidates[&target.item_name].trash);
    assert_eq!(service.phase_of(P), DigPhase::Digging);
    assert_eq!(target.position, Vec3::new(1.5, 0.0, 0.0));
    assert!(backend.is_movement_locked(P));

    // the spawning action applied no progress and armed the cooldown
    assert!((target.dig_progress() - target.max_progress / 3.0).abs() < 1e-9);
    assert_eq!(
        service.dig(P, 0.1),
        DigOutcome::Rejected(RejectReason::Cooldown)
    );
    assert!(matches!(service.dig(P, 0.3), DigOutcome::Progressed { .. }));
}

#[test]
fn test_dig_anywhere_at_full_radius_survives_ticks() {
    let (mut service, backend) = service_with(LootTables::default(), Profile::default());
    backend.set_dig_site_fraction(1.0);
    assert!(matches!(
        service.dig(P, 0.0),
        DigOutcome::FallbackStarted { .. }
    ));

    for i in 1..=3 {
        service.tick(i as f64 * TICK, TICK);
    }
    assert_eq!(service.phase_of(P), DigPhase::Digging);
    assert!(resolved_reasons(&backend).is_empty());
    assert!(matches!(service.dig(P, 0.3), DigOutcome::Progressed { .. }));
}

#[test]
fn test_dig_anywhere_blocked_while_rolling() {
    let (mut service, _backend) = forge();
    assert!(service.begin_roll(P, 0.0));
    assert_eq!(
        service.dig(P, 0.1),
        DigOutcome::Rejected(RejectReason::NoTarget)
    );
}

#[test]
fn test_dig_anywhere_without_trash_candidates() {
    let mut tables = LootTables::default();
    tables
        .candidates
        .insert("Crown".into(), candidate(100.0, 1.0, false));
    tables.maps.insert("Vault".into(), vec!["Crown".into()]);
    let profile = Profile {
        current_map: "Vault".into(),
        ..Profile::default()
    };
    let (mut service, _backend) = service_with(tables, profile);
    assert_eq!(
        service.dig(P, 0.0),
        DigOutcome::Rejected(RejectReason::NoCandidate)
    );
    assert_eq!(service.phase_of(P), DigPhase::NoTarget);
}

#[test]
fn test_unknown_player_is_rejected() {
    let (mut service, _backend) = forge();
    assert_eq!(
        service.dig(PlayerId(99), 0.0),
        DigOutcome::Rejected(RejectReason::UnknownPlayer)
    );
}

// ============================================================
// Teardown
// ============================================================

#[test]
fn test_zone_change_fails_active_target() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    service.zone_changed(P, "Canyon", 1.0);
    assert_eq!(service.phase_of(P), DigPhase::NoTarget);
    assert!(service.is_connected(P));

    let resolved: Vec<_> = backend
        .notifications()
        .into_iter()
        .filter(|(_, n)| matches!(n, Notification::TargetResolved { .. }))
        .collect();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].0, Recipient::All);
    assert_eq!(resolved_reasons(&backend), vec![ResolveReason::ZoneChanged]);
}

#[test]
fn test_zone_change_cancels_roll() {
    let (mut service, _backend) = forge();
    assert!(service.begin_roll(P, 0.0));
    service.zone_changed(P, "Canyon", 0.5);
    assert!(!service.is_rolling(P));
    assert_eq!(service.end_roll(P, 0.6), None);
}

#[test]
fn test_disconnect_tears_everything_down() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    backend.set_position(P, Vec3::new(12.0, 0.0, 0.0));
    service.tick(1.0, TICK);

    service.disconnect(P, 2.0);
    assert!(!service.is_connected(P));
    assert!(service.registry().is_empty());
    assert!(!backend.is_movement_locked(P));
    assert_eq!(resolved_reasons(&backend), vec![ResolveReason::Disconnected]);

    // stale input after disconnect
    assert_eq!(
        service.dig(P, 3.0),
        DigOutcome::Rejected(RejectReason::UnknownPlayer)
    );
}

// ============================================================
// Spawn retries & waypoints
// ============================================================

#[test]
fn test_spawn_retries_until_dig_site_found() {
    let (mut service, backend) = forge();
    backend.block_dig_queries(2);
    roll_and_release(&mut service, 0.0);
    assert!(service.target_of(P).is_none());
    assert!(service.is_spawn_pending(P));

    // first retry after 0.5s, second 1.0s later
    service.tick(PEAK + 0.6, TICK);
    assert!(service.is_spawn_pending(P));
    service.tick(PEAK + 1.7, TICK);
    assert!(!service.is_spawn_pending(P));
    assert_eq!(service.phase_of(P), DigPhase::Idle);
}

#[test]
fn test_spawn_retries_are_bounded() {
    let (mut service, backend) = forge();
    backend.set_dig_sites_available(false);
    roll_and_release(&mut service, 0.0);

    for i in 1..=40 {
        service.tick(PEAK + i as f64 * 0.5, 0.5);
    }
    assert!(!service.is_spawn_pending(P));
    assert!(service.target_of(P).is_none());
    assert!(service.begin_roll(P, 30.0), "player can roll again");
}

#[test]
fn test_waypoint_updates_are_throttled() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    let waypoints =
        |b: &MemoryBackend| count_notifications(b, |n| matches!(n, Notification::WaypointUpdate { .. }));

    service.tick(1.0, TICK);
    assert!(service.is_nearby(P));
    assert_eq!(waypoints(&backend), 1);

    service.tick(1.1, TICK);
    assert_eq!(waypoints(&backend), 1);

    // moved 5 units towards the target
    backend.set_position(P, Vec3::new(5.0, 0.0, 0.0));
    service.tick(1.2, TICK);
    assert_eq!(waypoints(&backend), 2);

    service.tick(2.3, TICK);
    assert_eq!(waypoints(&backend), 3);

    let last = backend.notifications().into_iter().rev().find_map(|(r, n)| match n {
        Notification::WaypointUpdate { direction, distance, .. } => Some((r, direction, distance)),
        _ => None,
    });
    assert_eq!(last, Some((Recipient::Player(P), Vec3::X, 10.0)));
}

#[test]
fn test_no_waypoints_without_detector_in_hand() {
    let (mut service, backend) = forge();
    roll_and_release(&mut service, 0.0);
    assert!(service.equip(P, Tool::Empty));
    service.tick(1.0, TICK);
    assert!(!service.is_nearby(P));
    assert_eq!(
        count_notifications(&backend, |n| matches!(n, Notification::WaypointUpdate { .. })),
        0
    );
}
