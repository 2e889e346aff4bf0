//! Brain-side autonomy switch and action denylist.

use crate::resolver::intent::IntentTable;
use sentient_core::config::PolicyConfig;
use sentient_core::types::AutonomyMode;
use std::collections::HashSet;
use std::sync::RwLock;

/// Global autonomy mode, changed only through an explicit administrative call.
#[derive(Debug, Default)]
pub struct AutonomySwitch {
    mode: RwLock<AutonomyMode>,
}

impl AutonomySwitch {
    pub fn new(mode: AutonomyMode) -> Self {
        Self {
            mode: RwLock::new(mode),
        }
    }

    pub fn get(&self) -> AutonomyMode {
        *self.mode.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the mode and return it.
    pub fn set(&self, mode: AutonomyMode) -> AutonomyMode {
        let mut current = self.mode.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current != mode {
            tracing::warn!(target: "audit", from = %*current, to = %mode, "Autonomy mode changed");
        }
        *current = mode;
        mode
    }
}

/// Denylist of canonical actions that are never forwarded to the kernel.
pub struct ActionPolicy {
    denylist: HashSet<String>,
    table: IntentTable,
}

impl ActionPolicy {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            denylist: config
                .denylist
                .iter()
                .map(|a| a.trim().to_uppercase())
                .collect(),
            table: IntentTable::new(),
        }
    }

    /// Canonical name the kernel would resolve `raw_action` to.
    pub fn canonical_name(&self, raw_action: &str) -> String {
        match self.table.lookup(raw_action) {
            Some(hit) => hit.action,
            None => raw_action.trim().to_uppercase(),
        }
    }

    /// Returns the denial reason if `raw_action` is denylisted.
    pub fn check(&self, raw_action: &str) -> Result<(), String> {
        let canonical = self.canonical_name(raw_action);
        if self.denylist.contains(&canonical) {
            tracing::warn!(target: "audit", action = %canonical, "Denylisted action refused");
            return Err(format!("Action {} is not permitted", canonical));
        }
        Ok(())
    }
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_defaults_off() {
        assert_eq!(AutonomySwitch::default().get(), AutonomyMode::Off);
    }

    #[test]
    fn test_switch_set_returns_new_mode() {
        let switch = AutonomySwitch::default();
        assert_eq!(switch.set(AutonomyMode::Real), AutonomyMode::Real);
        assert_eq!(switch.get(), AutonomyMode::Real);
    }

    #[test]
    fn test_default_denylist() {
        let policy = ActionPolicy::default();
        assert!(policy.check("shutdown").is_err());
        assert!(policy.check(" FORMAT_DRIVE ").is_err());
        assert!(policy.check("delete_system32").is_err());
        assert!(policy.check("OPEN_APP").is_ok());
    }

    #[test]
    fn test_denial_reason_names_action() {
        let policy = ActionPolicy::default();
        assert_eq!(
            policy.check("shutdown").unwrap_err(),
            "Action SHUTDOWN is not permitted"
        );
    }

    #[test]
    fn test_check_uses_canonical_name() {
        let policy = ActionPolicy::new(&PolicyConfig {
            denylist: vec!["hotkey".to_string()],
        });
        // "copy" resolves to HOTKEY.
        assert!(policy.check("copy").is_err());
        assert!(policy.check("click").is_ok());
    }
}
