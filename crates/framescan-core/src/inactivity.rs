//! Inactivity deadline for battery-powered scanning.
//!
//! A capture session that sits idle with the camera open drains the
//! battery, so each decode activity re-arms a deadline; once it expires the
//! owning session should be shut down. The timer is only armed while the
//! device runs on battery; on external power it never expires.
//!
//! All clock reads are injected, so the logic is deterministic under test.

use std::time::{Duration, Instant};

/// How long a session may sit without decode activity before it should be
/// shut down.
pub const INACTIVITY_DELAY: Duration = Duration::from_secs(5 * 60);

/// Tracks the inactivity deadline for one capture session.
#[derive(Debug, Default)]
pub struct InactivityTimer {
    deadline: Option<Instant>,
    on_battery: bool,
}

impl InactivityTimer {
    /// Create a disarmed timer (external power assumed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record scanning activity, pushing the deadline out.
    pub fn on_activity(&mut self, now: Instant) {
        if self.on_battery {
            self.deadline = Some(now + INACTIVITY_DELAY);
        }
    }

    /// Update the power source. Moving to battery arms the timer; moving to
    /// external power disarms it.
    pub fn set_battery_powered(&mut self, on_battery: bool, now: Instant) {
        self.on_battery = on_battery;
        self.deadline = if on_battery {
            Some(now + INACTIVITY_DELAY)
        } else {
            None
        };
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    /// Drop any armed deadline without changing the power source.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_expires_on_external_power() {
        let mut timer = InactivityTimer::new();
        let now = Instant::now();
        timer.on_activity(now);
        assert!(!timer.is_expired(now + INACTIVITY_DELAY * 2));
    }

    #[test]
    fn test_expires_after_delay_on_battery() {
        let mut timer = InactivityTimer::new();
        let now = Instant::now();
        timer.set_battery_powered(true, now);

        assert!(!timer.is_expired(now + INACTIVITY_DELAY - Duration::from_secs(1)));
        assert!(timer.is_expired(now + INACTIVITY_DELAY));
    }

    #[test]
    fn test_activity_pushes_deadline_out() {
        let mut timer = InactivityTimer::new();
        let now = Instant::now();
        timer.set_battery_powered(true, now);

        let later = now + INACTIVITY_DELAY - Duration::from_secs(1);
        timer.on_activity(later);
        assert!(!timer.is_expired(now + INACTIVITY_DELAY));
        assert!(timer.is_expired(later + INACTIVITY_DELAY));
    }

    #[test]
    fn test_moving_to_external_power_disarms() {
        let mut timer = InactivityTimer::new();
        let now = Instant::now();
        timer.set_battery_powered(true, now);
        timer.set_battery_powered(false, now);
        assert!(!timer.is_expired(now + INACTIVITY_DELAY * 2));
    }

    #[test]
    fn test_disarm_clears_deadline() {
        let mut timer = InactivityTimer::new();
        let now = Instant::now();
        timer.set_battery_powered(true, now);
        timer.disarm();
        assert!(!timer.is_expired(now + INACTIVITY_DELAY * 2));
    }
}
