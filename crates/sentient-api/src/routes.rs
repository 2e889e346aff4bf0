//! Router setup for the Brain and Kernel services.
//!
//! Configures the axum Routers with CORS, tracing, body limits, and the
//! kernel's bearer-token middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use sentient_core::error::SentientError;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{brain, kernel};
use crate::state::{BrainState, KernelState};
use crate::ws;

/// Create the Brain router.
pub fn brain_router(state: BrainState) -> Router {
    // Allow localhost origins for a dashboard served next to the brain.
    let port = state.config.brain.port;
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    Router::new()
        .route("/health", get(brain::health))
        .route("/v1/system/mode", get(brain::get_mode).post(brain::set_mode))
        .route("/v1/action/request", post(brain::request_action))
        .route("/v1/plans", get(brain::list_plans).post(brain::create_plan))
        .route(
            "/v1/plans/{id}",
            get(brain::get_plan).delete(brain::abandon_plan),
        )
        .route("/v1/actions/confirm", post(brain::confirm_action))
        .route("/v1/actions/reject", post(brain::reject_action))
        .route("/v1/pool/stats", get(brain::pool_stats))
        .route("/v1/stream", get(brain::stream))
        .route("/ws", get(ws::ws_handler))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Create the Kernel router. Everything except `/health` sits behind auth.
pub fn kernel_router(state: KernelState) -> Router {
    let protected = Router::new()
        .route("/action/run", post(kernel::run_action))
        .route("/v1/safety", get(kernel::get_safety).post(kernel::set_safety))
        .route("/v1/audit", get(kernel::audit))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    Router::new()
        .route("/health", get(kernel::health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve `router` until the shutdown future resolves.
pub async fn serve(
    addr: &str,
    router: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), SentientError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SentientError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SentientError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
