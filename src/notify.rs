//! Outbound presentation events.
//!
//! Fire-and-forget: the core never waits on delivery and never reads
//! anything back from the presentation layer.

use bevy::math::Vec3;

use crate::dig::{ResolveReason, TargetId};
use crate::player::PlayerId;

/// Who a notification is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Player(PlayerId),
    AllExcept(PlayerId),
    All,
}

impl Recipient {
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Recipient::Player(p) => *p == player,
            Recipient::AllExcept(p) => *p != player,
            Recipient::All => true,
        }
    }
}

/// Something handed out on a successful dig
#[derive(Debug, Clone, PartialEq)]
pub enum GrantedReward {
    Item { name: String, weight: f64 },
    Currency { name: String, amount: u64 },
    Experience { amount: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    TargetSpawned {
        target_id: TargetId,
        item_name: String,
        position: Vec3,
        dig_everywhere: bool,
    },
    DiggingStarted {
        target_id: TargetId,
        progress: f64,
        max_progress: f64,
    },
    /// Replicated to other clients for the dig visual
    ProgressReplicated {
        owner: PlayerId,
        target_id: TargetId,
        progress: f64,
        max_progress: f64,
    },
    TargetResolved {
        owner: PlayerId,
        target_id: TargetId,
        item_name: String,
        reason: ResolveReason,
        rewards: Vec<GrantedReward>,
    },
    WaypointUpdate {
        target_id: TargetId,
        direction: Vec3,
        distance: f32,
    },
}
