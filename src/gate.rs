//! Request admission control
//!
//! The gate combines two flags: `enabled` (the data source is not exhausted)
//! and `in_flight` (a request is outstanding). A fetch may only be issued after
//! a successful [`RequestGate::try_acquire`], and every acquire is matched by
//! exactly one [`RequestGate::release`].
//!
//! The flags are plain booleans. The gate lives inside the controller, which is
//! only ever driven from one logical thread, so no atomics are involved.

/// Enabled / in-flight admission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestGate {
    enabled: bool,
    in_flight: bool,
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestGate {
    /// Create an enabled, idle gate
    pub fn new() -> Self {
        Self {
            enabled: true,
            in_flight: false,
        }
    }

    /// Start of a fresh pagination sequence
    pub fn reset(&mut self) {
        self.enabled = true;
        self.in_flight = false;
    }

    /// Check whether a request could be admitted right now
    pub fn can_acquire(&self) -> bool {
        self.enabled && !self.in_flight
    }

    /// Admit a request if the gate is enabled and idle
    pub fn try_acquire(&mut self) -> bool {
        if !self.can_acquire() {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Complete the outstanding request
    pub fn release(&mut self, still_enabled: bool) {
        self.in_flight = false;
        self.enabled = still_enabled;
    }

    /// Allow fetching again without touching the in-flight flag
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop fetching without touching the in-flight flag
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Is fetching allowed (not exhausted)?
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Is a request outstanding?
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_gate_admits() {
        let gate = RequestGate::new();
        assert!(gate.is_enabled());
        assert!(!gate.is_in_flight());
        assert!(gate.can_acquire());
    }

    #[test]
    fn test_single_admission() {
        let mut gate = RequestGate::new();
        assert!(gate.try_acquire());
        assert!(gate.is_in_flight());

        // Second acquire fails until release
        assert!(!gate.try_acquire());
        assert!(!gate.try_acquire());

        gate.release(true);
        assert!(!gate.is_in_flight());
        assert!(gate.try_acquire());
    }

    #[test]
    fn test_release_disabled() {
        let mut gate = RequestGate::new();
        assert!(gate.try_acquire());
        gate.release(false);

        assert!(!gate.is_enabled());
        assert!(!gate.is_in_flight());
        assert!(!gate.try_acquire());
    }

    #[test]
    fn test_enable_does_not_clear_in_flight() {
        let mut gate = RequestGate::new();
        assert!(gate.try_acquire());

        gate.disable();
        gate.enable();
        assert!(gate.is_in_flight());
        assert!(!gate.try_acquire());
    }

    #[test]
    fn test_disable_blocks_admission() {
        let mut gate = RequestGate::new();
        gate.disable();
        assert!(!gate.can_acquire());
        assert!(!gate.try_acquire());
        assert!(!gate.is_in_flight());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut gate = RequestGate::new();
        assert!(gate.try_acquire());
        gate.disable();

        gate.reset();
        let once = gate;
        gate.reset();

        assert_eq!(gate, once);
        assert_eq!(gate, RequestGate::new());
    }
}
