//! Shared state for the Brain and Kernel routers.
//!
//! Both are passed to handlers via axum's State extractor. All fields use
//! `Arc` for cheap cloning across handler tasks.

use std::sync::Arc;
use std::time::Instant;

use sentient_action::bridge::{ActionBridge, ActionGateway};
use sentient_action::channel::{BroadcastChannel, PushChannel};
use sentient_action::executor::Executor;
use sentient_action::orchestrator::Orchestrator;
use sentient_action::policy::{ActionPolicy, AutonomySwitch};
use sentient_action::pool::WorkerPool;
use sentient_core::config::SentientConfig;
use sentient_core::types::AutonomyMode;

/// State of the reasoning service.
#[derive(Clone)]
pub struct BrainState {
    pub config: Arc<SentientConfig>,
    /// Global autonomy mode, changed only through `POST /v1/system/mode`.
    pub autonomy: Arc<AutonomySwitch>,
    pub gateway: Arc<ActionGateway>,
    pub orchestrator: Arc<Orchestrator>,
    pub pool: Arc<WorkerPool>,
    /// Push fan-out for SSE and WebSocket clients.
    pub channel: Arc<BroadcastChannel>,
    pub start_time: Instant,
}

impl BrainState {
    /// Wire the Brain around `bridge`. Autonomy starts OFF.
    pub fn new(config: SentientConfig, bridge: Arc<dyn ActionBridge>) -> Self {
        let autonomy = Arc::new(AutonomySwitch::new(AutonomyMode::Off));
        let gateway = Arc::new(ActionGateway::new(
            Arc::clone(&autonomy),
            ActionPolicy::new(&config.policy),
            bridge,
        ));
        let pool = Arc::new(WorkerPool::from_config(config.brain.pool_size));
        let channel = Arc::new(BroadcastChannel::default());
        let orchestrator = Arc::new(Orchestrator::new(
            &config,
            Arc::clone(&gateway),
            Arc::clone(&pool),
            Arc::clone(&channel) as Arc<dyn PushChannel>,
        ));

        Self {
            config: Arc::new(config),
            autonomy,
            gateway,
            orchestrator,
            pool,
            channel,
            start_time: Instant::now(),
        }
    }
}

/// State of the privileged execution host.
#[derive(Clone)]
pub struct KernelState {
    pub executor: Arc<Executor>,
    /// Bearer token for privileged routes. `None` disables the check.
    pub api_token: Option<String>,
    pub start_time: Instant,
}

impl KernelState {
    pub fn new(executor: Arc<Executor>, api_token: Option<String>) -> Self {
        Self {
            executor,
            api_token,
            start_time: Instant::now(),
        }
    }
}
