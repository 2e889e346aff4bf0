//! Static intent table.
//!
//! Maps loose natural-language phrases onto canonical (action, params)
//! pairs. Lookups are exact after lower-casing and trimming.

use crate::types::CanonicalAction;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Read-only phrase to canonical action table.
pub struct IntentTable {
    entries: HashMap<&'static str, (&'static str, Value)>,
}

impl Default for IntentTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentTable {
    /// Build the table with every known phrase.
    pub fn new() -> Self {
        let mut entries = HashMap::new();

        // =====================================================================
        // Application launch
        // =====================================================================
        for phrase in ["open notepad", "launch notepad", "start notepad"] {
            entries.insert(phrase, ("OPEN_APP", json!("notepad")));
        }
        for phrase in ["open calc", "open calculator", "launch calculator"] {
            entries.insert(phrase, ("OPEN_APP", json!("calc")));
        }

        // =====================================================================
        // Pointer
        // =====================================================================
        entries.insert("click mouse", ("CLICK", json!({"button": "left"})));
        entries.insert("left click", ("CLICK", json!({"button": "left"})));
        entries.insert("right click", ("CLICK", json!({"button": "right"})));
        entries.insert(
            "double click",
            ("CLICK", json!({"button": "left", "count": 2})),
        );

        // =====================================================================
        // Scrolling
        // =====================================================================
        entries.insert(
            "scroll up",
            ("SCROLL", json!({"direction": "up", "amount": 300})),
        );
        entries.insert(
            "scroll down",
            ("SCROLL", json!({"direction": "down", "amount": 300})),
        );
        entries.insert(
            "scroll slowly",
            ("SCROLL", json!({"direction": "down", "amount": 100})),
        );

        // =====================================================================
        // Keyboard shortcuts
        // =====================================================================
        let hotkeys: [(&'static str, Value); 7] = [
            ("copy", json!(["ctrl", "c"])),
            ("paste", json!(["ctrl", "v"])),
            ("select all", json!(["ctrl", "a"])),
            ("undo", json!(["ctrl", "z"])),
            ("save", json!(["ctrl", "s"])),
            ("switch window", json!(["alt", "tab"])),
            ("open settings", json!(["win", "i"])),
        ];
        for (phrase, keys) in hotkeys {
            entries.insert(phrase, ("HOTKEY", keys));
        }

        Self { entries }
    }

    /// Exact lookup of a normalized phrase.
    pub fn lookup(&self, raw_action: &str) -> Option<CanonicalAction> {
        let key = raw_action.trim().to_lowercase();
        self.entries
            .get(key.as_str())
            .map(|(action, params)| CanonicalAction::new(*action, params.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
