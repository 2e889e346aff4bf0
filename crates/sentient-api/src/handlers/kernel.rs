//! Kernel handlers: action execution, safety lock, audit trail.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use sentient_action::executor::audit::AuditRecord;
use sentient_core::types::{ExecutionRequest, ExecutionResult};

use super::HealthResponse;
use crate::state::KernelState;

const DEFAULT_AUDIT_LIMIT: usize = 50;

#[derive(Debug, Serialize, Deserialize)]
pub struct SafetyState {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct AuditParams {
    pub limit: Option<usize>,
}

/// GET /health
pub async fn health(State(state): State<KernelState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        "kernel",
        state.start_time.elapsed().as_secs(),
    ))
}

/// POST /action/run - never fails at the HTTP level once authenticated.
pub async fn run_action(
    State(state): State<KernelState>,
    Json(request): Json<ExecutionRequest>,
) -> Json<ExecutionResult> {
    tracing::debug!(action = %request.action, mode = %request.mode, agent_id = %request.agent_id, "Action received");
    Json(state.executor.execute(&request).await)
}

/// GET /v1/safety
pub async fn get_safety(State(state): State<KernelState>) -> Json<SafetyState> {
    Json(SafetyState {
        enabled: state.executor.safety().is_enabled(),
    })
}

/// POST /v1/safety - returns the new effective state.
pub async fn set_safety(
    State(state): State<KernelState>,
    Json(body): Json<SafetyState>,
) -> Json<SafetyState> {
    Json(SafetyState {
        enabled: state.executor.safety().set(body.enabled),
    })
}

/// GET /v1/audit?limit=N - newest first.
pub async fn audit(
    State(state): State<KernelState>,
    Query(params): Query<AuditParams>,
) -> Json<Vec<AuditRecord>> {
    let limit = params.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
    Json(state.executor.audit().recent(limit))
}
