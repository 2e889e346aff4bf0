//! Scroll wheel handler.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActionError;
use crate::executor::desktop::Desktop;
use crate::executor::handler::{int_field, ActionHandler};

const DEFAULT_AMOUNT: i64 = 300;
const MAX_AMOUNT: i64 = 5000;

/// Handler for `SCROLL`.
///
/// Params: a signed integer (positive scrolls up) or
/// `{"direction": "up" | "down", "amount": 300}`.
pub struct ScrollHandler;

fn out_of_range(amount: u64) -> ActionError {
    ActionError::InvalidPayload(format!(
        "Scroll amount must be 1-{}, got {}",
        MAX_AMOUNT, amount
    ))
}

/// Signed scroll delta, positive meaning up. Magnitudes above `MAX_AMOUNT`
/// are rejected here so callers can negate and cast freely.
fn delta(params: &Value) -> Result<i64, ActionError> {
    if let Some(n) = params.as_i64() {
        if n.unsigned_abs() > MAX_AMOUNT as u64 {
            return Err(out_of_range(n.unsigned_abs()));
        }
        return Ok(n);
    }
    if !params.is_object() {
        return Err(ActionError::InvalidPayload(
            "SCROLL needs an amount or a direction".to_string(),
        ));
    }

    let amount = int_field(params, "amount").unwrap_or(DEFAULT_AMOUNT).unsigned_abs();
    if amount > MAX_AMOUNT as u64 {
        return Err(out_of_range(amount));
    }
    let amount = amount as i64;
    match params.get("direction").and_then(|v| v.as_str()) {
        Some("up") | None => Ok(amount),
        Some("down") => Ok(-amount),
        Some(other) => Err(ActionError::InvalidPayload(format!(
            "Unknown scroll direction: {}",
            other
        ))),
    }
}

#[async_trait]
impl ActionHandler for ScrollHandler {
    fn action_name(&self) -> &'static str {
        "SCROLL"
    }

    async fn execute(&self, params: &Value, desktop: &dyn Desktop) -> Result<String, ActionError> {
        let delta = delta(params)?;
        if delta == 0 {
            return Err(out_of_range(0));
        }

        desktop.scroll(delta as i32).await?;
        let direction = if delta > 0 { "up" } else { "down" };
        Ok(format!("Scrolled {} {}", direction, delta.abs()))
    }

    fn describe(&self, params: &Value) -> String {
        match delta(params) {
            Ok(d) if d > 0 => format!("Scroll up {}", d),
            Ok(d) => format!("Scroll down {}", d.abs()),
            Err(_) => "Scroll".to_string(),
        }
    }
}
