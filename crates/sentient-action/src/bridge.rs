//! Brain to Kernel action bridge.
//!
//! [`ActionBridge`] carries one execution request to the executor and back.
//! [`HttpBridge`] does it over HTTP; [`LocalBridge`] calls an in-process
//! executor. [`ActionGateway`] sits in front of either and applies the Brain's
//! autonomy mode and denylist.

use crate::error::BridgeError;
use crate::executor::Executor;
use crate::policy::{ActionPolicy, AutonomySwitch};
use async_trait::async_trait;
use sentient_core::config::BrainConfig;
use sentient_core::types::{AutonomyMode, ExecutionRequest, ExecutionResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Reason reported when autonomy is OFF.
pub const AUTONOMY_OFF: &str = "Autonomy is OFF";

/// Transport between the orchestrator and the executor.
#[async_trait]
pub trait ActionBridge: Send + Sync {
    /// Deliver the request; transport problems surface as `BridgeError`.
    async fn send(&self, request: &ExecutionRequest) -> Result<ExecutionResult, BridgeError>;
}

// =============================================================================
// HTTP transport
// =============================================================================

/// Posts requests to the kernel's `/action/run`.
pub struct HttpBridge {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpBridge {
    pub fn new(
        kernel_url: &str,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Connect(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/action/run", kernel_url.trim_end_matches('/')),
            token,
        })
    }

    pub fn from_config(config: &BrainConfig, token: Option<String>) -> Result<Self, BridgeError> {
        Self::new(
            &config.kernel_url,
            Duration::from_millis(config.bridge_timeout_ms),
            token,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ActionBridge for HttpBridge {
    async fn send(&self, request: &ExecutionRequest) -> Result<ExecutionResult, BridgeError> {
        let mut req = self.client.post(&self.endpoint).json(request);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let response = req.send().await?.error_for_status()?;
        let result: ExecutionResult = response.json().await?;
        Ok(result)
    }
}

// =============================================================================
// In-process transport
// =============================================================================

/// Calls an executor living in the same process.
pub struct LocalBridge {
    executor: Arc<Executor>,
}

impl LocalBridge {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ActionBridge for LocalBridge {
    async fn send(&self, request: &ExecutionRequest) -> Result<ExecutionResult, BridgeError> {
        Ok(self.executor.execute(request).await)
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Result of a Brain-side action request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GatewayOutcome {
    Denied { reason: String },
    Executed { result: ExecutionResult },
    Error { message: String },
}

impl GatewayOutcome {
    /// Flatten into the executor-level result used for plan bookkeeping.
    pub fn into_result(self) -> ExecutionResult {
        match self {
            GatewayOutcome::Denied { reason } => ExecutionResult::denied(reason),
            GatewayOutcome::Executed { result } => result,
            GatewayOutcome::Error { message } => ExecutionResult::error(message),
        }
    }
}

/// Applies autonomy mode and denylist, then forwards through the bridge.
pub struct ActionGateway {
    autonomy: Arc<AutonomySwitch>,
    policy: ActionPolicy,
    bridge: Arc<dyn ActionBridge>,
}

impl ActionGateway {
    pub fn new(
        autonomy: Arc<AutonomySwitch>,
        policy: ActionPolicy,
        bridge: Arc<dyn ActionBridge>,
    ) -> Self {
        Self {
            autonomy,
            policy,
            bridge,
        }
    }

    pub fn autonomy(&self) -> &AutonomySwitch {
        &self.autonomy
    }

    pub async fn request(
        &self,
        action: &str,
        params: serde_json::Value,
        agent_id: &str,
    ) -> GatewayOutcome {
        let mode = self.autonomy.get();
        if mode == AutonomyMode::Off {
            tracing::info!(action = %action, agent_id = %agent_id, "Action denied: autonomy OFF");
            return GatewayOutcome::Denied {
                reason: AUTONOMY_OFF.to_string(),
            };
        }
        if let Err(reason) = self.policy.check(action) {
            return GatewayOutcome::Denied { reason };
        }

        let request = ExecutionRequest::new(action, params, mode).with_agent(agent_id);
        tracing::info!(action = %action, mode = %mode, agent_id = %agent_id, "Forwarding action to kernel");
        match self.bridge.send(&request).await {
            Ok(result) => GatewayOutcome::Executed { result },
            Err(e) => {
                tracing::warn!(action = %action, error = %e, "Kernel request failed");
                GatewayOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::desktop::HeadlessDesktop;
    use sentient_core::config::SentientConfig;
    use sentient_core::types::ExecutionStatus;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and always reports a refused connection.
    struct FailingBridge {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ActionBridge for FailingBridge {
        async fn send(&self, _request: &ExecutionRequest) -> Result<ExecutionResult, BridgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BridgeError::Connect("connection refused".to_string()))
        }
    }

    fn gateway(mode: AutonomyMode, bridge: Arc<dyn ActionBridge>) -> ActionGateway {
        ActionGateway::new(
            Arc::new(AutonomySwitch::new(mode)),
            ActionPolicy::default(),
            bridge,
        )
    }

    fn local_bridge() -> (Arc<Executor>, Arc<LocalBridge>) {
        let executor = Arc::new(Executor::new(
            &SentientConfig::default(),
            Arc::new(HeadlessDesktop::default()),
        ));
        (Arc::clone(&executor), Arc::new(LocalBridge::new(executor)))
    }

    #[tokio::test]
    async fn test_gateway_off_denies_without_calling_bridge() {
        let bridge = Arc::new(FailingBridge {
            calls: AtomicUsize::new(0),
        });
        let gw = gateway(AutonomyMode::Off, bridge.clone());
        let outcome = gw.request("OPEN_APP", json!("notepad"), "user").await;
        assert_eq!(
            outcome,
            GatewayOutcome::Denied {
                reason: AUTONOMY_OFF.to_string()
            }
        );
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gateway_denylist() {
        let bridge = Arc::new(FailingBridge {
            calls: AtomicUsize::new(0),
        });
        let gw = gateway(AutonomyMode::Real, bridge.clone());
        let outcome = gw.request("shutdown", json!(null), "user").await;
        assert!(matches!(outcome, GatewayOutcome::Denied { .. }));
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gateway_transport_error() {
        let bridge = Arc::new(FailingBridge {
            calls: AtomicUsize::new(0),
        });
        let gw = gateway(AutonomyMode::Simulated, bridge);
        let outcome = gw.request("CLICK", json!(null), "user").await;
        assert!(matches!(outcome, GatewayOutcome::Error { .. }));
        let result = outcome.into_result();
        assert_eq!(result.status, ExecutionStatus::Error);
        assert!(result.message().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_gateway_simulated_through_local_bridge() {
        let (_, bridge) = local_bridge();
        let gw = gateway(AutonomyMode::Simulated, bridge);
        let outcome = gw.request("open notepad", json!(null), "user").await;
        match outcome {
            GatewayOutcome::Executed { result } => {
                assert_eq!(result.status, ExecutionStatus::Simulated);
                assert_eq!(result.action.as_deref(), Some("OPEN_APP"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gateway_real_requires_kernel_lock() {
        let (executor, bridge) = local_bridge();
        let gw = gateway(AutonomyMode::Real, bridge);

        let outcome = gw.request("CLICK", json!(null), "user").await.into_result();
        assert_eq!(outcome.status, ExecutionStatus::Denied);

        executor.safety().enable();
        let outcome = gw.request("CLICK", json!(null), "user").await.into_result();
        assert_eq!(outcome.status, ExecutionStatus::Success);
    }

    #[test]
    fn test_gateway_outcome_wire_format() {
        let json = serde_json::to_value(GatewayOutcome::Denied {
            reason: AUTONOMY_OFF.to_string(),
        })
        .unwrap();
        assert_eq!(json, json!({"status": "denied", "reason": "Autonomy is OFF"}));

        let json = serde_json::to_value(GatewayOutcome::Executed {
            result: ExecutionResult::simulated("CLICK"),
        })
        .unwrap();
        assert_eq!(json["status"], "executed");
        assert_eq!(json["result"]["status"], "simulated");
    }

    #[test]
    fn test_http_bridge_endpoint() {
        let bridge = HttpBridge::new("http://127.0.0.1:8001/", Duration::from_secs(1), None).unwrap();
        assert_eq!(bridge.endpoint(), "http://127.0.0.1:8001/action/run");
    }

    // ---- HttpBridge against a live listener ----

    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_bridge_round_trip_with_token() {
        let router = axum::Router::new().route(
            "/action/run",
            axum::routing::post(
                |headers: axum::http::HeaderMap, axum::Json(req): axum::Json<ExecutionRequest>| async move {
                    let auth = headers
                        .get(axum::http::header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    let result = if auth == "Bearer secret" && req.mode == AutonomyMode::Simulated {
                        ExecutionResult::simulated(req.action)
                    } else {
                        ExecutionResult::denied("bad token")
                    };
                    axum::Json(result)
                },
            ),
        );
        let url = serve(router).await;

        let bridge = HttpBridge::new(&url, Duration::from_secs(2), Some("secret".to_string())).unwrap();
        let request = ExecutionRequest::new("CLICK", json!(null), AutonomyMode::Simulated);
        let result = bridge.send(&request).await.unwrap();
        assert_eq!(result, ExecutionResult::simulated("CLICK"));
    }

    #[tokio::test]
    async fn test_http_bridge_bad_status() {
        let router = axum::Router::new().route(
            "/action/run",
            axum::routing::post(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let url = serve(router).await;

        let bridge = HttpBridge::new(&url, Duration::from_secs(2), None).unwrap();
        let request = ExecutionRequest::new("CLICK", json!(null), AutonomyMode::Real);
        let err = bridge.send(&request).await.unwrap_err();
        assert!(matches!(err, BridgeError::Status(500)));
    }

    #[tokio::test]
    async fn test_http_bridge_undecodable_body() {
        let router = axum::Router::new().route(
            "/action/run",
            axum::routing::post(|| async { "not json" }),
        );
        let url = serve(router).await;

        let bridge = HttpBridge::new(&url, Duration::from_secs(2), None).unwrap();
        let request = ExecutionRequest::new("CLICK", json!(null), AutonomyMode::Real);
        let err = bridge.send(&request).await.unwrap_err();
        assert!(matches!(err, BridgeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_http_bridge_timeout() {
        let router = axum::Router::new().route(
            "/action/run",
            axum::routing::post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let url = serve(router).await;

        let bridge = HttpBridge::new(&url, Duration::from_millis(100), None).unwrap();
        let request = ExecutionRequest::new("CLICK", json!(null), AutonomyMode::Real);
        let err = bridge.send(&request).await.unwrap_err();
        assert!(matches!(err, BridgeError::Timeout));
    }

    #[tokio::test]
    async fn test_http_bridge_unreachable_kernel_is_error_result() {
        // Port 9 (discard) is essentially never listening on loopback.
        let bridge = HttpBridge::new("http://127.0.0.1:9", Duration::from_millis(500), None).unwrap();
        let gw = gateway(AutonomyMode::Simulated, Arc::new(bridge));
        let result = gw.request("CLICK", json!(null), "user").await.into_result();
        assert_eq!(result.status, ExecutionStatus::Error);
    }
}
