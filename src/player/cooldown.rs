/// Timestamp-based cooldown gate.
///
/// Armed with the current time and a duration; active until the server clock
/// passes the ready time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cooldown {
    ready_at: Option<f64>,
}

impl Cooldown {
    pub fn is_active(&self, now: f64) -> bool {
        self.ready_at.is_some_and(|ready_at| now < ready_at)
    }

    pub fn arm(&mut self, now: f64, duration: f64) {
        self.ready_at = Some(now + duration.max(0.0));
    }
}
