//! Plan/confirmation orchestrator.
//!
//! Surfaces one plan step at a time over the push channel, runs confirmed
//! steps through the gateway on the worker pool, and advances, halts, or
//! abandons the plan according to the outcome.

use crate::bridge::{ActionGateway, GatewayOutcome};
use crate::channel::PushChannel;
use crate::error::PlanError;
use crate::executor::handler::ActionRegistry;
use crate::plan::{Dropped, PlanBook, Progress};
use crate::pool::WorkerPool;
use crate::resolver::intent::IntentTable;
use crate::types::{CanonicalAction, PendingAction, PlanSnapshot, PlanState, StepSpec};
use sentient_core::config::SentientConfig;
use sentient_core::events::PushMessage;
use sentient_core::types::{ExecutionResult, ExecutionStatus, Timestamp};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

pub const REJECTED_BY_USER: &str = "Rejected by user";
pub const ABANDONED: &str = "Plan abandoned";
pub const TIMED_OUT: &str = "Confirmation timed out";

/// Drives plans through the confirmation loop.
pub struct Orchestrator {
    book: Mutex<PlanBook>,
    gateway: Arc<ActionGateway>,
    pool: Arc<WorkerPool>,
    channel: Arc<dyn PushChannel>,
    intents: IntentTable,
    registry: ActionRegistry,
}

impl Orchestrator {
    pub fn new(
        config: &SentientConfig,
        gateway: Arc<ActionGateway>,
        pool: Arc<WorkerPool>,
        channel: Arc<dyn PushChannel>,
    ) -> Self {
        Self {
            book: Mutex::new(
                PlanBook::new(Duration::from_secs(config.confirmation.timeout_secs))
                    .with_retention(Duration::from_secs(config.confirmation.retention_secs)),
            ),
            gateway,
            pool,
            channel,
            intents: IntentTable::new(),
            registry: ActionRegistry::with_defaults(&config.kernel.app_whitelist),
        }
    }

    pub fn gateway(&self) -> &ActionGateway {
        &self.gateway
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Create a plan and push its first step for confirmation.
    pub fn create_plan(
        &self,
        steps: Vec<StepSpec>,
        agent_id: &str,
    ) -> Result<PendingAction, PlanError> {
        let pending = self.lock_book().create(steps, agent_id, Instant::now())?;
        self.request_confirmation(&pending);
        Ok(pending)
    }

    /// Execute the step unlocked by `action_id` and move its plan on.
    ///
    /// Unknown or already consumed ids are refused without side effect.
    pub async fn confirm(&self, action_id: Uuid) -> Result<ExecutionResult, PlanError> {
        let claimed = {
            let mut book = self.lock_book();
            match book.begin_confirm(action_id, Instant::now()) {
                Ok(pending) => book
                    .snapshot(pending.plan_id)
                    .map(|plan| (pending, plan.agent_id)),
                Err(e) => Err(e),
            }
        };
        let (pending, agent_id) = match claimed {
            Ok(claimed) => claimed,
            Err(PlanError::Expired(id)) => {
                self.publish_expired(id);
                return Err(PlanError::Expired(id));
            }
            Err(e) => return Err(e),
        };

        let (intent, summary) = self.summarize(&pending.execution_payload);
        tracing::info!(
            action_id = %action_id,
            plan_id = %pending.plan_id,
            step_index = pending.step_index,
            action = %intent,
            "Action confirmed"
        );
        self.channel.publish(PushMessage::Notification {
            content: format!("Action confirmed. Executing: {}", summary),
            plan_id: Some(pending.plan_id),
            status: None,
        });

        let result = self.run_step(&pending, agent_id).await;

        let progress = self.lock_book().finish_step(
            pending.plan_id,
            pending.step_index,
            result.clone(),
            Instant::now(),
        )?;

        self.channel.publish(PushMessage::Notification {
            content: outcome_text(&result, &summary),
            plan_id: Some(pending.plan_id),
            status: Some(result.status),
        });
        match progress {
            Progress::Next(next) => self.request_confirmation(&next),
            Progress::Completed => self.channel.publish(PushMessage::PlanCompleted {
                plan_id: pending.plan_id,
            }),
            Progress::Halted { step_index, reason } => {
                self.channel.publish(PushMessage::PlanHalted {
                    plan_id: pending.plan_id,
                    step_index,
                    reason,
                })
            }
            Progress::Abandoned => {}
        }

        Ok(result)
    }

    /// Decline the step unlocked by `action_id`; the plan is abandoned.
    pub fn reject(&self, action_id: Uuid) -> Result<PlanSnapshot, PlanError> {
        let (dropped, snapshot) = {
            let mut book = self.lock_book();
            let dropped = book.reject(action_id)?;
            let snapshot = book.snapshot(dropped.plan_id)?;
            (dropped, snapshot)
        };
        tracing::info!(action_id = %action_id, plan_id = %dropped.plan_id, "Action rejected");
        self.publish_abandoned(&dropped, REJECTED_BY_USER);
        Ok(snapshot)
    }

    /// Abandon a plan and destroy its pending action.
    pub fn abandon(&self, plan_id: Uuid) -> Result<PlanSnapshot, PlanError> {
        let snapshot = self.lock_book().abandon(plan_id)?;
        if let PlanState::Abandoned { step_index } = snapshot.state {
            self.publish_abandoned(&Dropped { plan_id, step_index }, ABANDONED);
        }
        Ok(snapshot)
    }

    /// Reject every pending action past its deadline. Returns how many.
    pub fn sweep_expired(&self) -> usize {
        let (dropped, evicted) = {
            let mut book = self.lock_book();
            let now = Instant::now();
            let dropped = book.expire(now);
            (dropped, book.evict_finished(now))
        };
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted finished plans");
        }
        for entry in &dropped {
            tracing::info!(plan_id = %entry.plan_id, step_index = entry.step_index, "Pending action expired");
            self.publish_abandoned(entry, TIMED_OUT);
        }
        dropped.len()
    }

    pub fn snapshot(&self, plan_id: Uuid) -> Result<PlanSnapshot, PlanError> {
        self.lock_book().snapshot(plan_id)
    }

    pub fn list(&self) -> Vec<PlanSnapshot> {
        self.lock_book().list()
    }

    pub fn pending_count(&self) -> usize {
        self.lock_book().pending_count()
    }

    /// Canonical action name and a human readable summary of a step.
    fn summarize(&self, step: &StepSpec) -> (String, String) {
        let canonical = self.intents.lookup(&step.action).unwrap_or_else(|| {
            CanonicalAction::new(step.action.trim().to_uppercase(), step.params.clone())
        });
        let summary = self.registry.describe(&canonical.action, &canonical.params);
        (canonical.action, summary)
    }

    async fn run_step(&self, pending: &PendingAction, agent_id: String) -> ExecutionResult {
        let gateway = Arc::clone(&self.gateway);
        let action = pending.execution_payload.action.clone();
        let params = pending.execution_payload.params.clone();

        let submitted = self.pool.submit(async move {
            gateway.request(&action, params, &agent_id).await
        });
        match submitted {
            Ok(handle) => match handle.await {
                Ok(outcome) => outcome.into_result(),
                Err(e) => {
                    tracing::error!(plan_id = %pending.plan_id, error = %e, "Step task did not finish");
                    GatewayOutcome::Error {
                        message: e.to_string(),
                    }
                    .into_result()
                }
            },
            Err(e) => {
                tracing::error!(plan_id = %pending.plan_id, error = %e, "Worker pool refused step");
                ExecutionResult::error(e.to_string())
            }
        }
    }

    fn request_confirmation(&self, pending: &PendingAction) {
        let (intent, summary) = self.summarize(&pending.execution_payload);
        let remaining = pending.expires_at.saturating_duration_since(Instant::now());
        let expires_at = Timestamp(Timestamp::now().0 + remaining.as_secs() as i64);
        self.channel.publish(PushMessage::ConfirmationRequest {
            action_id: pending.action_id,
            plan_id: pending.plan_id,
            step_index: pending.step_index,
            intent,
            summary,
            payload: pending.execution_payload.params.clone(),
            expires_at,
        });
    }

    fn publish_abandoned(&self, dropped: &Dropped, reason: &str) {
        self.channel.publish(PushMessage::PlanAbandoned {
            plan_id: dropped.plan_id,
            step_index: dropped.step_index,
            reason: reason.to_string(),
        });
    }

    fn publish_expired(&self, action_id: Uuid) {
        tracing::info!(action_id = %action_id, "Confirmation arrived after expiry");
        self.channel.publish(PushMessage::notification(format!(
            "{}. The plan was abandoned.",
            TIMED_OUT
        )));
    }

    fn lock_book(&self) -> MutexGuard<'_, PlanBook> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Notification text for a step outcome. Denials and duplicates read
/// differently so a user can tell a refusal from a skipped repeat.
fn outcome_text(result: &ExecutionResult, summary: &str) -> String {
    match result.status {
        ExecutionStatus::Success => format!("Done: {}", result.message()),
        ExecutionStatus::Simulated => format!("Simulated: {}", summary),
        ExecutionStatus::Duplicate => format!("Skipped duplicate: {}", summary),
        ExecutionStatus::Denied => format!("Denied: {}", result.message()),
        ExecutionStatus::Failed => format!("Failed: {}", result.message()),
        ExecutionStatus::Error => format!("Error: {}", result.message()),
    }
}
