//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent `{error, message}` body across both
//! services, mapping pipeline errors to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sentient_action::error::PlanError;
use sentient_core::error::SentientError;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 401 Unauthorized - missing or wrong bearer token.
    Unauthorized(String),
    /// 404 Not Found - unknown plan or action id.
    NotFound(String),
    /// 409 Conflict - the plan is already finished.
    Conflict(String),
    /// 410 Gone - the confirmation window closed.
    Gone(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Gone(msg) => (StatusCode::GONE, "expired", msg),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        let message = err.to_string();
        match err {
            PlanError::EmptyPlan => ApiError::BadRequest(message),
            PlanError::NotFound(_) | PlanError::UnknownConfirmation(_) => {
                ApiError::NotFound(message)
            }
            PlanError::Expired(_) => ApiError::Gone(message),
            PlanError::AlreadyFinished(_) | PlanError::InvalidTransition(..) => {
                ApiError::Conflict(message)
            }
        }
    }
}

impl From<SentientError> for ApiError {
    fn from(err: SentientError) -> Self {
        match &err {
            SentientError::InvalidMode(_) | SentientError::Config(_) => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_plan_error_status_mapping() {
        let status = |e: PlanError| ApiError::from(e).into_response().status();
        assert_eq!(status(PlanError::EmptyPlan), StatusCode::BAD_REQUEST);
        assert_eq!(status(PlanError::UnknownConfirmation(Uuid::new_v4())), StatusCode::NOT_FOUND);
        assert_eq!(status(PlanError::NotFound(Uuid::new_v4())), StatusCode::NOT_FOUND);
        assert_eq!(status(PlanError::Expired(Uuid::new_v4())), StatusCode::GONE);
        assert_eq!(status(PlanError::AlreadyFinished(Uuid::new_v4())), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_mode_is_bad_request() {
        let err = ApiError::from(SentientError::InvalidMode("TURBO".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
