//! External collaborators the dig core talks to.
//!
//! Persistence, inventory, economy, leveling, entitlements, presentation and
//! world geometry all live outside this crate. The core only needs these
//! narrow contracts; every call is synchronous and must return quickly.

mod memory;

pub use memory::MemoryBackend;

use std::sync::Arc;

use bevy::math::Vec3;

use crate::dig::TargetId;
use crate::notify::{Notification, Recipient};
use crate::player::{PlayerId, Profile, Tool};

/// Item handed to the inventory collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct GrantedItem {
    pub id: TargetId,
    pub name: String,
    pub weight: f64,
    pub map_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory of {0} is full")]
    Full(PlayerId),
    #[error("item {1} not found for {0}")]
    NotFound(PlayerId, TargetId),
}

pub trait ProfileStore: Send + Sync {
    /// `None` means the profile has not loaded yet
    fn get_profile(&self, player: PlayerId) -> Option<Profile>;
    fn set_profile(&self, player: PlayerId, profile: Profile);
}

pub trait Inventory: Send + Sync {
    fn add_item(&self, player: PlayerId, item: &GrantedItem) -> Result<(), InventoryError>;
    fn remove_item(&self, player: PlayerId, item_id: TargetId) -> Result<(), InventoryError>;
}

pub trait Economy: Send + Sync {
    fn give_currency(&self, player: PlayerId, amount: u64);
    fn has_enough_currency(&self, player: PlayerId, amount: u64) -> bool;
}

pub trait Leveling: Send + Sync {
    fn add_experience(&self, player: PlayerId, amount: u64);
}

pub trait Entitlements: Send + Sync {
    fn owns_entitlement(&self, player: PlayerId, id: &str) -> bool;
    /// Temporary server-wide luck multiplier (1.0 when none is active)
    fn server_luck_multiplier(&self, player: PlayerId) -> f64;
}

pub trait Notifier: Send + Sync {
    fn send(&self, recipient: Recipient, notification: Notification);
}

/// World geometry and avatar control
pub trait World: Send + Sync {
    fn player_position(&self, player: PlayerId) -> Option<Vec3>;
    /// Valid dig position within `radius` of `center`, avoiding obstacles
    fn find_dig_position(&self, center: Vec3, radius: f32) -> Option<Vec3>;
    fn set_movement_locked(&self, player: PlayerId, locked: bool);
    fn show_tool(&self, player: PlayerId, tool: Tool);
}

/// Bundle of collaborator handles owned by the service
#[derive(Clone)]
pub struct Collaborators {
    pub profiles: Arc<dyn ProfileStore>,
    pub inventory: Arc<dyn Inventory>,
    pub economy: Arc<dyn Economy>,
    pub leveling: Arc<dyn Leveling>,
    pub entitlements: Arc<dyn Entitlements>,
    pub notifier: Arc<dyn Notifier>,
    pub world: Arc<dyn World>,
}

impl Collaborators {
    /// Route every contract to one in-memory backend
    pub fn in_memory(backend: Arc<MemoryBackend>) -> Self {
        Self {
            profiles: backend.clone(),
            inventory: backend.clone(),
            economy: backend.clone(),
            leveling: backend.clone(),
            entitlements: backend.clone(),
            notifier: backend.clone(),
            world: backend,
        }
    }
}
