//! Centralized tuning constants for the dig core.
//!
//! These are the defaults `DigConfig` starts from. Per-item numbers (rarity,
//! weight ranges, tool stats) live in the loot tables, not here.

// =====================================================
// Luck roll oscillator
// =====================================================

/// Angular speed of the skill-check oscillator: raw = sin(elapsed * PI * ROLL_FREQUENCY)
pub const ROLL_FREQUENCY: f64 = 0.75;

/// Shaped values above this magnitude snap to 1.0
pub const ROLL_MAGNET_THRESHOLD: f64 = 0.9;

/// Roll values are scaled into [0, ROLL_SCALE]
pub const ROLL_SCALE: f64 = 10.0;

/// Returned by a roll that ended before the first tick computed a value
pub const DEFAULT_ROLL_VALUE: f64 = 0.5;

// =====================================================
// Digging
// =====================================================

/// Maximum owner-to-target distance for a legitimate dig
pub const DIG_RANGE: f32 = 6.0;

/// Dig actions further than DIG_RANGE * this force a failure
pub const ANTI_CHEAT_RANGE_MULTIPLIER: f32 = 2.0;

/// Fraction of max progress lost per second while digging
pub const DECAY_RATE_PER_SECOND: f64 = 0.05;

/// Minimum interval between two accepted dig actions
pub const DIG_COOLDOWN_SECS: f64 = 0.2;

/// Blocks the "dig anywhere" path right after a successful dig
pub const SUCCESS_COOLDOWN_SECS: f64 = 3.0;

/// Idle targets that are never reached expire after this long
pub const TARGET_LIFETIME_SECS: f64 = 300.0;

/// max_progress = BASE_MAX_PROGRESS + weight * PROGRESS_PER_WEIGHT
pub const BASE_MAX_PROGRESS: f64 = 40.0;

/// Extra max progress per unit of sampled weight
pub const PROGRESS_PER_WEIGHT: f64 = 15.0;

/// Digging progress starts at max_progress / STARTING_PROGRESS_DIVISOR
pub const STARTING_PROGRESS_DIVISOR: f64 = 3.0;

/// Shovel contribution: tool multiplier * BASE_SHOVEL_STRENGTH
pub const BASE_SHOVEL_STRENGTH: f64 = 5.0;

/// Experience granted per unit of weight
pub const EXPERIENCE_PER_WEIGHT: f64 = 10.0;

/// Entitlement that doubles effective dig strength
pub const DOUBLE_STRENGTH_ENTITLEMENT: &str = "double_strength";

// =====================================================
// Spawning & proximity
// =====================================================

/// Radius around the owner searched for a detector-driven target
pub const SPAWN_SEARCH_RADIUS: f32 = 40.0;

/// Radius around the owner searched for a "dig anywhere" target
pub const FALLBACK_SEARCH_RADIUS: f32 = 3.0;

/// Bounded spawn retries before giving up
pub const SPAWN_MAX_ATTEMPTS: u32 = 5;

/// First retry delay; doubles per attempt
pub const SPAWN_RETRY_BASE_SECS: f64 = 0.5;

/// Upper bound for a single retry delay
pub const SPAWN_RETRY_MAX_SECS: f64 = 4.0;

/// Waypoint notifications are sent at most this often...
pub const WAYPOINT_INTERVAL_SECS: f64 = 1.0;

/// ...unless the owner moved at least this far since the last one
pub const WAYPOINT_MIN_DISPLACEMENT: f32 = 4.0;

/// Server tick rate (fixed timestep)
pub const TICK_RATE: u32 = 30;
