//! Bounded retry scheduler for spawn attempts.
//!
//! A spawn that misses (no dig site, no candidate, profile not loaded) is
//! rescheduled with exponential backoff until it runs out of attempts.

use std::collections::BTreeMap;

use crate::loot::CandidatePool;
use crate::player::PlayerId;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSpawn {
    pub player: PlayerId,
    /// Normalized luck computed when the roll ended
    pub luck: f64,
    pub pool: CandidatePool,
    pub search_radius: f32,
    /// 1-based attempt number of the next try
    pub attempt: u32,
    pub due_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    Rescheduled { attempt: u32, due_at: f64 },
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    pending: BTreeMap<PlayerId, PendingSpawn>,
    max_attempts: u32,
    base_delay: f64,
    max_delay: f64,
}

impl SpawnScheduler {
    pub fn new(max_attempts: u32, base_delay: f64, max_delay: f64) -> Self {
        Self {
            pending: BTreeMap::new(),
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Delay before the given (1-based) attempt
    pub fn backoff(&self, attempt: u32) -> f64 {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        (self.base_delay * 2f64.powi(exponent)).min(self.max_delay)
    }

    pub fn is_pending(&self, player: PlayerId) -> bool {
        self.pending.contains_key(&player)
    }

    pub fn cancel(&mut self, player: PlayerId) -> bool {
        self.pending.remove(&player).is_some()
    }

    /// Remove and return every spawn due at `now`
    pub fn take_due(&mut self, now: f64) -> Vec<PendingSpawn> {
        let due: Vec<PlayerId> = self
            .pending
            .values()
            .filter(|s| s.due_at <= now)
            .map(|s| s.player)
            .collect();
        due.into_iter()
            .filter_map(|player| self.pending.remove(&player))
            .collect()
    }

    /// Re-queue a failed attempt, or drop it once attempts run out
    pub fn retry(&mut self, mut spawn: PendingSpawn, now: f64) -> RetryDecision {
        if spawn.attempt >= self.max_attempts {
            return RetryDecision::Exhausted {
                attempts: spawn.attempt,
            };
        }
        let delay = self.backoff(spawn.attempt);
        spawn.attempt += 1;
        spawn.due_at = now + delay;
        let decision = RetryDecision::Rescheduled {
            attempt: spawn.attempt,
            due_at: spawn.due_at,
        };
        self.pending.insert(spawn.player, spawn);
        decision
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
