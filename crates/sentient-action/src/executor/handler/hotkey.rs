//! Keyboard shortcut handler.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActionError;
use crate::executor::desktop::Desktop;
use crate::executor::handler::ActionHandler;

const MAX_KEYS: usize = 4;

/// Handler for `HOTKEY`.
///
/// Params: `["ctrl", "c"]`, `"ctrl+c"`, or `{"keys": ["ctrl", "c"]}`.
pub struct HotkeyHandler;

fn keys(params: &Value) -> Option<Vec<String>> {
    let keys: Vec<String> = match params {
        Value::String(combo) => combo.split('+').map(|k| k.trim().to_lowercase()).collect(),
        Value::Array(items) => items
            .iter()
            .map(|k| k.as_str().map(|s| s.trim().to_lowercase()))
            .collect::<Option<Vec<_>>>()?,
        Value::Object(_) => return keys(params.get("keys")?),
        _ => return None,
    };
    if keys.is_empty() || keys.iter().any(|k| k.is_empty()) {
        return None;
    }
    Some(keys)
}

#[async_trait]
impl ActionHandler for HotkeyHandler {
    fn action_name(&self) -> &'static str {
        "HOTKEY"
    }

    async fn execute(&self, params: &Value, desktop: &dyn Desktop) -> Result<String, ActionError> {
        let keys = keys(params).ok_or_else(|| {
            ActionError::InvalidPayload("HOTKEY needs a list of key names".to_string())
        })?;
        if keys.len() > MAX_KEYS {
            return Err(ActionError::InvalidPayload(format!(
                "At most {} keys per hotkey",
                MAX_KEYS
            )));
        }

        desktop.hotkey(&keys).await?;
        Ok(format!("Pressed {}", keys.join("+")))
    }

    fn describe(&self, params: &Value) -> String {
        match keys(params) {
            Some(keys) => format!("Press {}", keys.join("+")),
            None => "Press hotkey".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::desktop::{DesktopCall, HeadlessDesktop};
    use serde_json::json;

    #[tokio::test]
    async fn test_hotkey_array() {
        let desktop = HeadlessDesktop::default();
        let detail = HotkeyHandler
            .execute(&json!(["ctrl", "c"]), &desktop)
            .await
            .unwrap();
        assert_eq!(detail, "Pressed ctrl+c");
        assert_eq!(
            desktop.calls(),
            vec![DesktopCall::Hotkey(vec!["ctrl".to_string(), "c".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_hotkey_combo_string_and_object() {
        let desktop = HeadlessDesktop::default();
        assert_eq!(
            HotkeyHandler.execute(&json!("Alt + Tab"), &desktop).await.unwrap(),
            "Pressed alt+tab"
        );
        assert_eq!(
            HotkeyHandler
                .execute(&json!({"keys": ["win", "i"]}), &desktop)
                .await
                .unwrap(),
            "Pressed win+i"
        );
    }

    #[tokio::test]
    async fn test_hotkey_rejects_malformed() {
        let desktop = HeadlessDesktop::default();
        for params in [json!([]), json!(["ctrl", 3]), json!("ctrl+"), json!(null)] {
            let err = HotkeyHandler.execute(&params, &desktop).await.unwrap_err();
            assert!(matches!(err, ActionError::InvalidPayload(_)), "{:?}", params);
        }
        let err = HotkeyHandler
            .execute(&json!(["a", "b", "c", "d", "e"]), &desktop)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidPayload(_)));
    }

    #[test]
    fn test_hotkey_describe() {
        assert_eq!(HotkeyHandler.describe(&json!(["ctrl", "s"])), "Press ctrl+s");
    }
}
