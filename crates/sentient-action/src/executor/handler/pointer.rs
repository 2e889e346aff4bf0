//! Pointer move and click handlers.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActionError;
use crate::executor::desktop::{Desktop, MouseButton};
use crate::executor::handler::{int_field, ActionHandler};

/// Extract `(x, y)` from `{"x": .., "y": ..}` or `[x, y]`.
fn coordinates(params: &Value) -> Option<(i64, i64)> {
    match params {
        Value::Array(items) if items.len() == 2 => {
            Some((items[0].as_i64()?, items[1].as_i64()?))
        }
        Value::Object(_) => Some((int_field(params, "x")?, int_field(params, "y")?)),
        _ => None,
    }
}

fn check_bounds(x: i64, y: i64, desktop: &dyn Desktop) -> Result<(i32, i32), ActionError> {
    let (width, height) = desktop.screen_size();
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return Err(ActionError::OutOfBounds {
            x,
            y,
            width,
            height,
        });
    }
    Ok((x as i32, y as i32))
}

/// Handler for `MOUSE_MOVE`. Params: `{"x": 100, "y": 200}` or `[100, 200]`.
pub struct MouseMoveHandler;

#[async_trait]
impl ActionHandler for MouseMoveHandler {
    fn action_name(&self) -> &'static str {
        "MOUSE_MOVE"
    }

    async fn execute(&self, params: &Value, desktop: &dyn Desktop) -> Result<String, ActionError> {
        let (x, y) = coordinates(params).ok_or_else(|| {
            ActionError::InvalidPayload("MOUSE_MOVE needs integer x and y".to_string())
        })?;
        let (x, y) = check_bounds(x, y, desktop)?;
        desktop.move_pointer(x, y).await?;
        Ok(format!("Moved to {},{}", x, y))
    }

    fn describe(&self, params: &Value) -> String {
        match coordinates(params) {
            Some((x, y)) => format!("Move pointer to ({}, {})", x, y),
            None => "Move pointer".to_string(),
        }
    }
}

/// Handler for `CLICK`.
///
/// Params are optional: `{"button": "right", "count": 2, "x": 10, "y": 20}`.
/// With coordinates the pointer is moved first.
pub struct ClickHandler;

impl ClickHandler {
    fn button(params: &Value) -> Result<MouseButton, ActionError> {
        match params.get("button").and_then(|v| v.as_str()) {
            Some(name) => name.parse(),
            None => Ok(MouseButton::Left),
        }
    }

    fn count(params: &Value) -> Result<u32, ActionError> {
        match int_field(params, "count") {
            None => Ok(1),
            Some(n) if (1..=3).contains(&n) => Ok(n as u32),
            Some(n) => Err(ActionError::InvalidPayload(format!(
                "Click count must be 1-3, got {}",
                n
            ))),
        }
    }
}

#[async_trait]
impl ActionHandler for ClickHandler {
    fn action_name(&self) -> &'static str {
        "CLICK"
    }

    async fn execute(&self, params: &Value, desktop: &dyn Desktop) -> Result<String, ActionError> {
        let button = Self::button(params)?;
        let count = Self::count(params)?;

        if let Some((x, y)) = coordinates(params) {
            let (x, y) = check_bounds(x, y, desktop)?;
            desktop.move_pointer(x, y).await?;
        }

        desktop.click(button, count).await?;
        if button == MouseButton::Left && count == 1 {
            Ok("Clicked".to_string())
        } else {
            Ok(format!("Clicked {} x{}", button.as_str(), count))
        }
    }

    fn describe(&self, params: &Value) -> String {
        let button = Self::button(params).unwrap_or(MouseButton::Left);
        match Self::count(params) {
            Ok(2) => format!("Double-click {} button", button.as_str()),
            _ => format!("Click {} button", button.as_str()),
        }
    }
}
