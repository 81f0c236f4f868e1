//! Digging session state machine.
//!
//! NoTarget -> Idle -> Digging -> Resolved. The registry holds at most one
//! target per owner; resolution removes it and `NoTarget` is implicit.

mod registry;
mod target;

pub use registry::{SpawnRejected, TargetRegistry};
pub use target::{DigProgress, Target, TargetId, TargetSpec};

use serde::{Deserialize, Serialize};

/// Observable phase of a player's dig session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigPhase {
    NoTarget,
    Idle,
    Digging,
}

/// Why a target left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolveReason {
    Success,
    /// Progress decayed to zero
    Decayed,
    /// Idle target was never reached
    Timeout,
    /// Owner too far from the target while digging
    DistanceViolation,
    ZoneChanged,
    Disconnected,
}

impl ResolveReason {
    pub fn is_success(self) -> bool {
        matches!(self, ResolveReason::Success)
    }
}
