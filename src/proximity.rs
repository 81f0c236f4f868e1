//! Detector proximity classification and waypoint throttling.
//!
//! The throttle only bounds notification volume. It never affects whether a
//! player can start digging.

use bevy::math::Vec3;

/// Where the owner stands relative to their target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    InDigRange,
    /// Inside the detector's search radius
    Nearby,
    Far,
}

pub fn classify(distance: f32, dig_range: f32, search_radius: f32) -> Proximity {
    if distance < dig_range {
        Proximity::InDigRange
    } else if distance < search_radius {
        Proximity::Nearby
    } else {
        Proximity::Far
    }
}

/// Rate limiter for waypoint-direction notifications
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaypointThrottle {
    last_sent_at: Option<f64>,
    last_position: Vec3,
}

impl WaypointThrottle {
    /// True when a notification should go out now; records it if so.
    ///
    /// Fires on the first call, then whenever `interval` seconds passed or
    /// the owner moved at least `min_displacement` since the last one.
    pub fn should_notify(
        &mut self,
        now: f64,
        position: Vec3,
        interval: f64,
        min_displacement: f32,
    ) -> bool {
        let due = match self.last_sent_at {
            None => true,
            Some(last) => {
                now - last >= interval
                    || position.distance(self.last_position) >= min_displacement
            }
        };
        if due {
            self.last_sent_at = Some(now);
            self.last_position = position;
        }
        due
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Unit direction from the owner towards the target (zero when coincident)
pub fn waypoint_direction(owner: Vec3, target: Vec3) -> Vec3 {
    (target - owner).normalize_or_zero()
}
