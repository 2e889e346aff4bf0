//! Keyboard text entry handler.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActionError;
use crate::executor::desktop::Desktop;
use crate::executor::handler::{string_param, ActionHandler};

/// Maximum characters typed in one action.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Handler for `TYPE_TEXT`. Params: `"hello"` or `{"text": "hello"}`.
pub struct TypeTextHandler;

#[async_trait]
impl ActionHandler for TypeTextHandler {
    fn action_name(&self) -> &'static str {
        "TYPE_TEXT"
    }

    async fn execute(&self, params: &Value, desktop: &dyn Desktop) -> Result<String, ActionError> {
        let text = string_param(params, "text").ok_or_else(|| {
            ActionError::InvalidPayload("TYPE_TEXT needs a text string".to_string())
        })?;

        let chars = text.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(ActionError::InvalidPayload(format!(
                "Text too long: {} chars (max {})",
                chars, MAX_TEXT_CHARS
            )));
        }

        desktop.type_text(text).await?;
        Ok(format!("Typed {} chars", chars))
    }

    fn describe(&self, params: &Value) -> String {
        match string_param(params, "text") {
            Some(text) => format!("Type text: \"{}\"", text),
            None => "Type text".to_string(),
        }
    }
}
