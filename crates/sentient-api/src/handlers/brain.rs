//! Brain handlers: autonomy mode, direct action requests, plans and
//! confirmations, pool stats, and the SSE push stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use sentient_action::bridge::GatewayOutcome;
use sentient_action::pool::PoolStats;
use sentient_action::types::{PlanSnapshot, StepSpec};
use sentient_core::types::{AutonomyMode, ExecutionResult};

use super::HealthResponse;
use crate::error::ApiError;
use crate::state::BrainState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeResponse {
    pub mode: AutonomyMode,
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetModeResponse {
    pub status: String,
    pub mode: AutonomyMode,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequestBody {
    pub action: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default = "default_agent")]
    pub agent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub steps: Vec<StepSpec>,
    #[serde(default = "default_agent")]
    pub agent_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePlanResponse {
    pub plan_id: Uuid,
    /// Confirmation token for the first step.
    pub action_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ActionIdRequest {
    pub action_id: Uuid,
}

fn default_agent() -> String {
    "user".to_string()
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<BrainState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        "brain",
        state.start_time.elapsed().as_secs(),
    ))
}

/// GET /v1/system/mode
pub async fn get_mode(State(state): State<BrainState>) -> Json<ModeResponse> {
    Json(ModeResponse {
        mode: state.autonomy.get(),
    })
}

/// POST /v1/system/mode - the only way to change autonomy.
pub async fn set_mode(
    State(state): State<BrainState>,
    Json(body): Json<SetModeRequest>,
) -> Result<Json<SetModeResponse>, ApiError> {
    let mode: AutonomyMode = body.mode.parse()?;
    let mode = state.autonomy.set(mode);
    Ok(Json(SetModeResponse {
        status: "ok".to_string(),
        mode,
    }))
}

/// POST /v1/action/request - single action outside any plan.
pub async fn request_action(
    State(state): State<BrainState>,
    Json(body): Json<ActionRequestBody>,
) -> Result<Json<GatewayOutcome>, ApiError> {
    if body.action.trim().is_empty() {
        return Err(ApiError::BadRequest("action must not be empty".to_string()));
    }
    let outcome = state
        .gateway
        .request(&body.action, body.params, &body.agent_id)
        .await;
    Ok(Json(outcome))
}

/// POST /v1/plans
pub async fn create_plan(
    State(state): State<BrainState>,
    Json(body): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<CreatePlanResponse>), ApiError> {
    let pending = state.orchestrator.create_plan(body.steps, &body.agent_id)?;
    Ok((
        StatusCode::CREATED,
        Json(CreatePlanResponse {
            plan_id: pending.plan_id,
            action_id: pending.action_id,
        }),
    ))
}

/// GET /v1/plans
pub async fn list_plans(State(state): State<BrainState>) -> Json<Vec<PlanSnapshot>> {
    Json(state.orchestrator.list())
}

/// GET /v1/plans/{id}
pub async fn get_plan(
    State(state): State<BrainState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<PlanSnapshot>, ApiError> {
    Ok(Json(state.orchestrator.snapshot(plan_id)?))
}

/// DELETE /v1/plans/{id} - abandon.
pub async fn abandon_plan(
    State(state): State<BrainState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<PlanSnapshot>, ApiError> {
    Ok(Json(state.orchestrator.abandon(plan_id)?))
}

/// POST /v1/actions/confirm
pub async fn confirm_action(
    State(state): State<BrainState>,
    Json(body): Json<ActionIdRequest>,
) -> Result<Json<ExecutionResult>, ApiError> {
    Ok(Json(state.orchestrator.confirm(body.action_id).await?))
}

/// POST /v1/actions/reject
pub async fn reject_action(
    State(state): State<BrainState>,
    Json(body): Json<ActionIdRequest>,
) -> Result<Json<PlanSnapshot>, ApiError> {
    Ok(Json(state.orchestrator.reject(body.action_id)?))
}

/// GET /v1/pool/stats
pub async fn pool_stats(State(state): State<BrainState>) -> Json<PoolStats> {
    Json(state.pool.stats())
}

/// GET /v1/stream - SSE push channel.
pub async fn stream(
    State(state): State<BrainState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = state.channel.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(message) => {
            let data = serde_json::to_string(&message).unwrap_or_default();
            Some(Ok(Event::default().event("push").data(data)))
        }
        // Lagged receivers skip what they missed.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
