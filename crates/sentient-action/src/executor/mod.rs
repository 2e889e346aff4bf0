//! Privileged action executor.
//!
//! Takes a raw action plus an autonomy mode and either simulates it or
//! performs it through a [`Desktop`] backend. REAL execution is additionally
//! gated by the process-local [`SafetyLock`]. Every REAL attempt lands in the
//! [`AuditLog`].

pub mod audit;
pub mod desktop;
pub mod handler;
pub mod safety;

use crate::error::ActionError;
use crate::executor::audit::{AuditLog, AuditRecord};
use crate::executor::desktop::Desktop;
use crate::executor::handler::ActionRegistry;
use crate::executor::safety::SafetyLock;
use crate::resolver::Resolver;
use crate::types::CanonicalAction;
use sentient_core::config::SentientConfig;
use sentient_core::types::{AutonomyMode, ExecutionRequest, ExecutionResult, Timestamp};
use std::sync::Arc;

/// Reason reported when REAL execution is attempted with the lock disabled.
pub const SAFETY_LOCK_ENGAGED: &str = "safety lock engaged";

/// Kernel-side executor. Never panics or returns an error; every outcome is
/// an [`ExecutionResult`].
pub struct Executor {
    resolver: Resolver,
    registry: ActionRegistry,
    desktop: Arc<dyn Desktop>,
    safety: SafetyLock,
    audit: AuditLog,
}

impl Executor {
    /// Executor with the built-in handlers.
    pub fn new(config: &SentientConfig, desktop: Arc<dyn Desktop>) -> Self {
        let registry = ActionRegistry::with_defaults(&config.kernel.app_whitelist);
        Self::with_registry(config, registry, desktop)
    }

    pub fn with_registry(
        config: &SentientConfig,
        registry: ActionRegistry,
        desktop: Arc<dyn Desktop>,
    ) -> Self {
        Self {
            resolver: Resolver::new(&config.pacing),
            registry,
            desktop,
            safety: SafetyLock::new(),
            audit: AuditLog::default(),
        }
    }

    pub fn safety(&self) -> &SafetyLock {
        &self.safety
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Handle one action request.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        match request.mode {
            AutonomyMode::Off => {
                tracing::warn!(action = %request.action, "Action reached executor with autonomy OFF");
                ExecutionResult::denied("Autonomy is OFF")
            }
            AutonomyMode::Simulated => self.simulate(request),
            AutonomyMode::Real => {
                let canonical = self.resolver.resolve(&request.action, &request.params);
                let result = self.execute_real(&canonical).await;
                self.audit.record(AuditRecord {
                    timestamp: Timestamp::now(),
                    agent_id: request.agent_id.clone(),
                    action: canonical.action,
                    params: canonical.params,
                    status: result.status,
                    message: result.message().to_string(),
                });
                result
            }
        }
    }

    fn simulate(&self, request: &ExecutionRequest) -> ExecutionResult {
        let canonical = self.resolver.resolve(&request.action, &request.params);
        if self.resolver.is_duplicate(&canonical) {
            tracing::debug!(action = %canonical.action, "Suppressed duplicate simulated action");
            return ExecutionResult::duplicate(canonical.action);
        }
        tracing::info!(action = %canonical.action, params = %canonical.params, "Simulated action");
        ExecutionResult::simulated(canonical.action)
    }

    async fn execute_real(&self, canonical: &CanonicalAction) -> ExecutionResult {
        if !self.safety.is_enabled() {
            tracing::warn!(action = %canonical.action, "REAL action denied by safety lock");
            return ExecutionResult::denied(SAFETY_LOCK_ENGAGED);
        }

        if self.resolver.is_duplicate(canonical) {
            tracing::info!(action = %canonical.action, "Suppressed duplicate action");
            return ExecutionResult::duplicate(canonical.action.clone());
        }

        let Some(handler) = self.registry.get(&canonical.action) else {
            tracing::warn!(action = %canonical.action, "Unknown action");
            return ActionError::UnknownAction(canonical.action.clone())
                .into_result(&canonical.action);
        };

        self.resolver.pace().await;

        let CanonicalAction { action, params } = canonical.clone();
        let desktop = Arc::clone(&self.desktop);
        let outcome =
            tokio::spawn(async move { handler.execute(&params, desktop.as_ref()).await }).await;

        match outcome {
            Ok(Ok(detail)) => {
                tracing::info!(action = %action, detail = %detail, "Action executed");
                ExecutionResult::success(action, detail)
            }
            Ok(Err(e)) => {
                tracing::warn!(action = %action, error = %e, "Action failed");
                e.into_result(&action)
            }
            Err(e) => {
                tracing::error!(action = %action, error = %e, "Action handler panicked");
                ExecutionResult::error(format!("Handler crashed: {}", e)).for_action(action)
            }
        }
    }
}
