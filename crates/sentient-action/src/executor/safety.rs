//! Kernel-local safety lock.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-local switch that must be enabled before any REAL action runs.
///
/// Starts disabled and is independent of the Brain's autonomy mode.
#[derive(Debug, Default)]
pub struct SafetyLock {
    enabled: AtomicBool,
}

impl SafetyLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Set the lock state and return the new effective value.
    pub fn set(&self, enabled: bool) -> bool {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            tracing::warn!(target: "audit", enabled, "Safety lock changed");
        }
        enabled
    }

    pub fn enable(&self) -> bool {
        self.set(true)
    }

    pub fn disable(&self) -> bool {
        self.set(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_disabled() {
        assert!(!SafetyLock::new().is_enabled());
    }

    #[test]
    fn test_enable_disable() {
        let lock = SafetyLock::new();
        assert!(lock.enable());
        assert!(lock.is_enabled());
        assert!(!lock.disable());
        assert!(!lock.is_enabled());
    }

    #[test]
    fn test_set_is_idempotent() {
        let lock = SafetyLock::new();
        lock.set(true);
        lock.set(true);
        assert!(lock.is_enabled());
    }
}
