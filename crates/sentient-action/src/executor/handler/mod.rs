//! Action handler registry and trait definition.
//!
//! Defines the `ActionHandler` async trait and provides the handler
//! registry for dispatching canonical actions to the correct implementation.

pub mod hotkey;
pub mod open_app;
pub mod pointer;
pub mod scroll;
pub mod type_text;

use crate::error::ActionError;
use crate::executor::desktop::Desktop;
use async_trait::async_trait;
use sentient_core::config::WhitelistedApp;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for canonical action implementations.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Canonical action name handled, e.g. `OPEN_APP`.
    fn action_name(&self) -> &'static str;

    /// Perform the action and return a short description of what happened.
    async fn execute(&self, params: &Value, desktop: &dyn Desktop) -> Result<String, ActionError>;

    /// Human-readable description for confirmation prompts.
    fn describe(&self, params: &Value) -> String;
}

/// Registry mapping canonical action names to handlers.
pub struct ActionRegistry {
    handlers: HashMap<&'static str, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with every built-in handler.
    pub fn with_defaults(whitelist: &[WhitelistedApp]) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(open_app::OpenAppHandler::new(whitelist)));
        registry.register(Arc::new(type_text::TypeTextHandler));
        registry.register(Arc::new(pointer::MouseMoveHandler));
        registry.register(Arc::new(pointer::ClickHandler));
        registry.register(Arc::new(scroll::ScrollHandler));
        registry.register(Arc::new(hotkey::HotkeyHandler));
        registry
    }

    /// Register a handler, replacing any existing handler for the same name.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.action_name(), handler);
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action).cloned()
    }

    /// Describe a canonical action, falling back to its raw form.
    pub fn describe(&self, action: &str, params: &Value) -> String {
        match self.get(action) {
            Some(handler) => handler.describe(params),
            None if params.is_null() => action.to_string(),
            None => format!("{} {}", action, params),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Param helpers
// ---------------------------------------------------------------------------

/// Params may be a bare string or an object carrying the value under `key`.
pub(crate) fn string_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    match params {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get(key).and_then(|v| v.as_str()),
        _ => None,
    }
}

pub(crate) fn int_field(params: &Value, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_f64().map(|f| f.round() as i64))
    })
}
