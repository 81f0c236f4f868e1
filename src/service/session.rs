use crate::luck::LuckRoll;
use crate::player::{Cooldown, Tool};
use crate::proximity::WaypointThrottle;

/// Process-local state for one connected player.
///
/// Dropped as a whole on disconnect; nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct PlayerSession {
    pub roll: Option<LuckRoll>,
    pub last_roll_value: Option<f64>,
    pub dig_cooldown: Cooldown,
    /// Blocks the "dig anywhere" path right after a success
    pub success_cooldown: Cooldown,
    pub waypoint: WaypointThrottle,
    pub holding: Tool,
    pub nearby: bool,
}

impl PlayerSession {
    pub fn new(holding: Tool) -> Self {
        Self {
            holding,
            ..Self::default()
        }
    }

    pub fn is_rolling(&self) -> bool {
        self.roll.is_some()
    }
}
