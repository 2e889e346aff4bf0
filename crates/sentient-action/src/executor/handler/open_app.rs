//! Application launch handler.
//!
//! Only applications on the configured whitelist can be started.

use async_trait::async_trait;
use sentient_core::config::WhitelistedApp;
use serde_json::Value;

use crate::error::ActionError;
use crate::executor::desktop::Desktop;
use crate::executor::handler::{string_param, ActionHandler};

/// Handler for `OPEN_APP`. Params: `"notepad"` or `{"app": "notepad"}`.
pub struct OpenAppHandler {
    whitelist: Vec<WhitelistedApp>,
}

impl OpenAppHandler {
    pub fn new(whitelist: &[WhitelistedApp]) -> Self {
        Self {
            whitelist: whitelist.to_vec(),
        }
    }

    fn program_for(&self, app: &str) -> Option<&str> {
        self.whitelist
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(app))
            .map(|entry| entry.program.as_str())
    }
}

#[async_trait]
impl ActionHandler for OpenAppHandler {
    fn action_name(&self) -> &'static str {
        "OPEN_APP"
    }

    async fn execute(&self, params: &Value, desktop: &dyn Desktop) -> Result<String, ActionError> {
        let app = string_param(params, "app").map(str::trim).unwrap_or("");
        if app.is_empty() {
            return Err(ActionError::InvalidPayload(
                "OPEN_APP needs an application name".to_string(),
            ));
        }

        let program = self
            .program_for(app)
            .ok_or_else(|| ActionError::NotWhitelisted(app.to_string()))?;

        desktop.launch(program).await?;
        Ok(format!("Opened {}", app))
    }

    fn describe(&self, params: &Value) -> String {
        let app = string_param(params, "app").unwrap_or("<no app>");
        format!("Open application: {}", app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::desktop::{DesktopCall, HeadlessDesktop};
    use serde_json::json;

    fn handler() -> OpenAppHandler {
        OpenAppHandler::new(&[
            WhitelistedApp::new("notepad", "notepad.exe"),
            WhitelistedApp::new("calc", "calc.exe"),
        ])
    }

    #[tokio::test]
    async fn test_open_whitelisted_app() {
        let desktop = HeadlessDesktop::default();
        let detail = handler().execute(&json!("notepad"), &desktop).await.unwrap();
        assert_eq!(detail, "Opened notepad");
        assert_eq!(
            desktop.calls(),
            vec![DesktopCall::Launch("notepad.exe".to_string())]
        );
    }

    #[tokio::test]
    async fn test_open_app_object_params_case_insensitive() {
        let desktop = HeadlessDesktop::default();
        let detail = handler()
            .execute(&json!({"app": "Calc"}), &desktop)
            .await
            .unwrap();
        assert_eq!(detail, "Opened Calc");
        assert_eq!(desktop.calls(), vec![DesktopCall::Launch("calc.exe".to_string())]);
    }

    #[tokio::test]
    async fn test_open_app_rejects_unlisted() {
        let desktop = HeadlessDesktop::default();
        let err = handler().execute(&json!("regedit"), &desktop).await.unwrap_err();
        assert!(matches!(err, ActionError::NotWhitelisted(ref app) if app == "regedit"));
        assert!(desktop.calls().is_empty());
    }

    #[tokio::test]
    async fn test_open_app_missing_name() {
        let desktop = HeadlessDesktop::default();
        let err = handler().execute(&json!({}), &desktop).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidPayload(_)));
        let err = handler().execute(&json!("  "), &desktop).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidPayload(_)));
    }

    #[test]
    fn test_open_app_describe() {
        assert_eq!(handler().describe(&json!("notepad")), "Open application: notepad");
        assert_eq!(handler().describe(&json!(null)), "Open application: <no app>");
    }
}
