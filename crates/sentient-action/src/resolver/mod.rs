//! Action resolution, duplicate suppression, and pacing.
//!
//! The resolver turns a loosely specified action into its canonical form and
//! owns the two pieces of shared timing state used by the executor.

pub mod history;
pub mod intent;
pub mod pacing;

use crate::resolver::history::ActionHistory;
use crate::resolver::intent::IntentTable;
use crate::resolver::pacing::Pacer;
use crate::types::CanonicalAction;
use sentient_core::config::PacingConfig;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Canonicalizes actions and tracks recently handled ones.
pub struct Resolver {
    table: IntentTable,
    history: Mutex<ActionHistory>,
    pacer: Pacer,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&PacingConfig::default())
    }
}

impl Resolver {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            table: IntentTable::new(),
            history: Mutex::new(ActionHistory::new(
                Duration::from_millis(config.retention_ms),
                Duration::from_millis(config.suppression_ms),
            )),
            pacer: Pacer::new(Duration::from_millis(config.min_interval_ms)),
        }
    }

    /// Map a raw action onto its canonical form.
    ///
    /// A table hit returns the mapped pair. A miss upper-cases the trimmed
    /// action name and passes the params through unchanged.
    pub fn resolve(&self, raw_action: &str, raw_params: &serde_json::Value) -> CanonicalAction {
        match self.table.lookup(raw_action) {
            Some(hit) => {
                tracing::debug!(raw = %raw_action, action = %hit.action, "Resolved intent phrase");
                hit
            }
            None => CanonicalAction::new(raw_action.trim().to_uppercase(), raw_params.clone()),
        }
    }

    /// Returns `true` if an identical canonical action was handled within the
    /// suppression window. Non-duplicates are recorded.
    pub fn is_duplicate(&self, action: &CanonicalAction) -> bool {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .check_and_record(action, Instant::now())
    }

    /// Delay the caller until the global minimum interval has elapsed.
    pub async fn pace(&self) {
        self.pacer.wait().await;
    }
}
