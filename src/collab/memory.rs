use std::collections::{HashMap, HashSet};

use bevy::math::Vec3;
use parking_lot::Mutex;

use super::{
    Economy, Entitlements, GrantedItem, Inventory, InventoryError, Leveling, Notifier,
    ProfileStore, World,
};
use crate::dig::TargetId;
use crate::notify::{Notification, Recipient};
use crate::player::{PlayerId, Profile, Tool};

#[derive(Debug)]
struct BackendState {
    profiles: HashMap<PlayerId, Profile>,
    inventories: HashMap<PlayerId, Vec<GrantedItem>>,
    inventory_capacity: usize,
    wallets: HashMap<PlayerId, u64>,
    experience: HashMap<PlayerId, u64>,
    entitlements: HashMap<PlayerId, HashSet<String>>,
    server_luck: HashMap<PlayerId, f64>,
    outbox: Vec<(Recipient, Notification)>,
    positions: HashMap<PlayerId, Vec3>,
    movement_locked: HashSet<PlayerId>,
    shown_tools: HashMap<PlayerId, Tool>,
    /// Dig sites sit at center + X * radius * fraction
    dig_site_fraction: f32,
    /// Number of upcoming dig-site queries that find nothing
    blocked_dig_queries: u32,
    dig_sites_available: bool,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            profiles: HashMap::new(),
            inventories: HashMap::new(),
            inventory_capacity: 64,
            wallets: HashMap::new(),
            experience: HashMap::new(),
            entitlements: HashMap::new(),
            server_luck: HashMap::new(),
            outbox: Vec::new(),
            positions: HashMap::new(),
            movement_locked: HashSet::new(),
            shown_tools: HashMap::new(),
            dig_site_fraction: 0.5,
            blocked_dig_queries: 0,
            dig_sites_available: true,
        }
    }
}

/// In-process stand-in for every collaborator.
///
/// Used by the headless server binary and by tests; it keeps everything in
/// memory and records outbound notifications.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<BackendState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&self, player: PlayerId, profile: Profile, position: Vec3) {
        let mut state = self.state.lock();
        state.profiles.insert(player, profile);
        state.positions.insert(player, position);
    }

    pub fn remove_profile(&self, player: PlayerId) {
        self.state.lock().profiles.remove(&player);
    }

    pub fn profile(&self, player: PlayerId) -> Option<Profile> {
        self.state.lock().profiles.get(&player).cloned()
    }

    pub fn set_position(&self, player: PlayerId, position: Vec3) {
        self.state.lock().positions.insert(player, position);
    }

    pub fn inventory(&self, player: PlayerId) -> Vec<GrantedItem> {
        self.state
            .lock()
            .inventories
            .get(&player)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_inventory_capacity(&self, capacity: usize) {
        self.state.lock().inventory_capacity = capacity;
    }

    pub fn currency(&self, player: PlayerId) -> u64 {
        self.state.lock().wallets.get(&player).copied().unwrap_or(0)
    }

    pub fn experience(&self, player: PlayerId) -> u64 {
        self.state.lock().experience.get(&player).copied().unwrap_or(0)
    }

    pub fn grant_entitlement(&self, player: PlayerId, id: &str) {
        self.state
            .lock()
            .entitlements
            .entry(player)
            .or_default()
            .insert(id.to_string());
    }

    pub fn set_server_luck(&self, player: PlayerId, multiplier: f64) {
        self.state.lock().server_luck.insert(player, multiplier);
    }

    pub fn notifications(&self) -> Vec<(Recipient, Notification)> {
        self.state.lock().outbox.clone()
    }

    pub fn take_notifications(&self) -> Vec<(Recipient, Notification)> {
        std::mem::take(&mut self.state.lock().outbox)
    }

    pub fn is_movement_locked(&self, player: PlayerId) -> bool {
        self.state.lock().movement_locked.contains(&player)
    }

    pub fn shown_tool(&self, player: PlayerId) -> Option<Tool> {
        self.state.lock().shown_tools.get(&player).copied()
    }

    pub fn set_dig_site_fraction(&self, fraction: f32) {
        self.state.lock().dig_site_fraction = fraction;
    }

    /// Make the next `count` dig-site queries fail
    pub fn block_dig_queries(&self, count: u32) {
        self.state.lock().blocked_dig_queries = count;
    }

    pub fn set_dig_sites_available(&self, available: bool) {
        self.state.lock().dig_sites_available = available;
    }
}

impl ProfileStore for MemoryBackend {
    fn get_profile(&self, player: PlayerId) -> Option<Profile> {
        self.profile(player)
    }

    fn set_profile(&self, player: PlayerId, profile: Profile) {
        self.state.lock().profiles.insert(player, profile);
    }
}

impl Inventory for MemoryBackend {
    fn add_item(&self, player: PlayerId, item: &GrantedItem) -> Result<(), InventoryError> {
        let mut state = self.state.lock();
        let capacity = state.inventory_capacity;
        let items = state.inventories.entry(player).or_default();
        if items.len() >= capacity {
            return Err(InventoryError::Full(player));
        }
        items.push(item.clone());
        Ok(())
    }

    fn remove_item(&self, player: PlayerId, item_id: TargetId) -> Result<(), InventoryError> {
        let mut state = self.state.lock();
        let items = state.inventories.entry(player).or_default();
        let index = items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or(InventoryError::NotFound(player, item_id))?;
        items.remove(index);
        Ok(())
    }
}

impl Economy for MemoryBackend {
    fn give_currency(&self, player: PlayerId, amount: u64) {
        let mut state = self.state.lock();
        let wallet = state.wallets.entry(player).or_default();
        *wallet = wallet.saturating_add(amount);
    }

    fn has_enough_currency(&self, player: PlayerId, amount: u64) -> bool {
        self.currency(player) >= amount
    }
}

impl Leveling for MemoryBackend {
    fn add_experience(&self, player: PlayerId, amount: u64) {
        let mut state = self.state.lock();
        let xp = state.experience.entry(player).or_default();
        *xp = xp.saturating_add(amount);
    }
}

impl Entitlements for MemoryBackend {
    fn owns_entitlement(&self, player: PlayerId, id: &str) -> bool {
        self.state
            .lock()
            .entitlements
            .get(&player)
            .is_some_and(|owned| owned.contains(id))
    }

    fn server_luck_multiplier(&self, player: PlayerId) -> f64 {
        self.state
            .lock()
            .server_luck
            .get(&player)
            .copied()
            .unwrap_or(1.0)
    }
}

impl Notifier for MemoryBackend {
    fn send(&self, recipient: Recipient, notification: Notification) {
        self.state.lock().outbox.push((recipient, notification));
    }
}

impl World for MemoryBackend {
    fn player_position(&self, player: PlayerId) -> Option<Vec3> {
        self.state.lock().positions.get(&player).copied()
    }

    fn find_dig_position(&self, center: Vec3, radius: f32) -> Option<Vec3> {
        let mut state = self.state.lock();
        if !state.dig_sites_available {
            return None;
        }
        if state.blocked_dig_queries > 0 {
            state.blocked_dig_queries -= 1;
            return None;
        }
        Some(center + Vec3::X * radius * state.dig_site_fraction)
    }

    fn set_movement_locked(&self, player: PlayerId, locked: bool) {
        let mut state = self.state.lock();
        if locked {
            state.movement_locked.insert(player);
        } else {
            state.movement_locked.remove(&player);
        }
    }

    fn show_tool(&self, player: PlayerId, tool: Tool) {
        self.state.lock().shown_tools.insert(player, tool);
    }
}
