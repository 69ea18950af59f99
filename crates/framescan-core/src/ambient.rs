//! Ambient-light torch policy.
//!
//! Decides when the camera torch should be toggled from ambient light
//! sensor readings, with hysteresis so small fluctuations around a single
//! threshold cannot flicker the torch. The camera collaborator applies the
//! requests.

/// Lux level at or below which the scene is too dark to scan.
pub const TOO_DARK_LUX: f32 = 45.0;

/// Lux level at or above which the torch is no longer needed.
pub const BRIGHT_ENOUGH_LUX: f32 = 450.0;

/// A requested torch transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorchRequest {
    /// Turn the torch on.
    On,
    /// Turn the torch off.
    Off,
}

/// Hysteresis state machine over ambient lux readings.
#[derive(Debug, Default)]
pub struct AmbientLightPolicy {
    torch_on: bool,
}

impl AmbientLightPolicy {
    /// Create a policy with the torch assumed off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one lux reading; returns a request only on a transition.
    ///
    /// Readings between the two thresholds leave the torch in its current
    /// state.
    pub fn observe(&mut self, lux: f32) -> Option<TorchRequest> {
        if lux <= TOO_DARK_LUX && !self.torch_on {
            self.torch_on = true;
            return Some(TorchRequest::On);
        }
        if lux >= BRIGHT_ENOUGH_LUX && self.torch_on {
            self.torch_on = false;
            return Some(TorchRequest::Off);
        }
        None
    }

    /// Whether the policy currently wants the torch on.
    pub fn torch_on(&self) -> bool {
        self.torch_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_reading_requests_torch_on() {
        let mut policy = AmbientLightPolicy::new();
        assert_eq!(policy.observe(10.0), Some(TorchRequest::On));
        assert!(policy.torch_on());
    }

    #[test]
    fn test_repeated_dark_readings_request_once() {
        let mut policy = AmbientLightPolicy::new();
        assert_eq!(policy.observe(10.0), Some(TorchRequest::On));
        assert_eq!(policy.observe(5.0), None);
        assert_eq!(policy.observe(44.9), None);
    }

    #[test]
    fn test_bright_reading_requests_torch_off() {
        let mut policy = AmbientLightPolicy::new();
        let _ = policy.observe(10.0);
        assert_eq!(policy.observe(500.0), Some(TorchRequest::Off));
        assert!(!policy.torch_on());
    }

    #[test]
    fn test_bright_reading_with_torch_off_does_nothing() {
        let mut policy = AmbientLightPolicy::new();
        assert_eq!(policy.observe(1000.0), None);
    }

    #[test]
    fn test_mid_range_keeps_current_state() {
        let mut policy = AmbientLightPolicy::new();
        // Torch off, mid-range: stays off.
        assert_eq!(policy.observe(200.0), None);
        assert!(!policy.torch_on());

        // Torch on, mid-range: stays on.
        let _ = policy.observe(10.0);
        assert_eq!(policy.observe(200.0), None);
        assert!(policy.torch_on());
    }

    #[test]
    fn test_threshold_boundaries() {
        let mut policy = AmbientLightPolicy::new();
        assert_eq!(policy.observe(TOO_DARK_LUX), Some(TorchRequest::On));
        assert_eq!(policy.observe(BRIGHT_ENOUGH_LUX), Some(TorchRequest::Off));
    }
}
