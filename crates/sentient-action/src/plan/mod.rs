//! Plan lifecycle management.
//!
//! [`PlanBook`] owns every plan together with the confirmation gate, so that
//! "one pending action per plan" is enforced under a single lock. It is pure
//! bookkeeping: no I/O, no awaiting.

pub mod state_machine;

use crate::confirmation::ConfirmationGate;
use crate::error::PlanError;
use crate::plan::state_machine::validate_transition;
use crate::types::{PendingAction, Plan, PlanSnapshot, PlanState, Step, StepSpec, StepStatus};
use sentient_core::types::{ExecutionResult, Timestamp};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// What a plan does after one of its steps finished.
#[derive(Debug, Clone)]
pub enum Progress {
    /// The next step is now awaiting confirmation.
    Next(PendingAction),
    Completed,
    Halted { step_index: usize, reason: String },
    /// The plan was abandoned while the step was executing.
    Abandoned,
}

/// A pending action that was rejected or timed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropped {
    pub plan_id: Uuid,
    pub step_index: usize,
}

/// How long a finished plan stays visible unless configured otherwise.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

/// In-memory plan store with the confirmation gate.
pub struct PlanBook {
    plans: HashMap<Uuid, Plan>,
    /// When each terminal plan was first seen finished by `evict_finished`.
    finished: HashMap<Uuid, Instant>,
    gate: ConfirmationGate,
    timeout: Duration,
    retention: Duration,
}

impl PlanBook {
    /// `timeout` is how long a surfaced step waits for confirmation.
    pub fn new(timeout: Duration) -> Self {
        Self {
            plans: HashMap::new(),
            finished: HashMap::new(),
            gate: ConfirmationGate::new(),
            timeout,
            retention: DEFAULT_RETENTION,
        }
    }

    /// Keep finished plans around for `retention` before evicting them.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Create a plan and surface its first step.
    pub fn create(
        &mut self,
        steps: Vec<StepSpec>,
        agent_id: &str,
        now: Instant,
    ) -> Result<PendingAction, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::EmptyPlan);
        }

        let plan_id = Uuid::new_v4();
        let plan = Plan {
            plan_id,
            agent_id: agent_id.to_string(),
            steps: steps.into_iter().map(Step::from).collect(),
            progress_index: 0,
            state: PlanState::Executing { step_index: 0 },
            created_at: Timestamp::now(),
        };
        self.plans.insert(plan_id, plan);
        tracing::info!(plan_id = %plan_id, agent_id = %agent_id, "Plan created");

        self.surface(plan_id, 0, now)
    }

    /// Claim a pending action for execution.
    ///
    /// The action id is consumed either way. An expired action rejects its
    /// step and abandons the plan.
    pub fn begin_confirm(
        &mut self,
        action_id: Uuid,
        now: Instant,
    ) -> Result<PendingAction, PlanError> {
        let pending = self
            .gate
            .take(action_id)
            .ok_or(PlanError::UnknownConfirmation(action_id))?;

        if pending.expires_at <= now {
            self.drop_step(&pending)?;
            tracing::info!(action_id = %action_id, plan_id = %pending.plan_id, "Confirmation arrived after expiry");
            return Err(PlanError::Expired(action_id));
        }

        let plan = self
            .plans
            .get_mut(&pending.plan_id)
            .ok_or(PlanError::NotFound(pending.plan_id))?;
        let step = &mut plan.steps[pending.step_index];
        validate_transition(step.status, StepStatus::Confirmed)?;
        step.status = StepStatus::Confirmed;
        plan.progress_index = pending.step_index + 1;
        plan.state = PlanState::Executing {
            step_index: pending.step_index,
        };

        Ok(pending)
    }

    /// Record the outcome of a confirmed step and move the plan on.
    pub fn finish_step(
        &mut self,
        plan_id: Uuid,
        step_index: usize,
        result: ExecutionResult,
        now: Instant,
    ) -> Result<Progress, PlanError> {
        let plan = self
            .plans
            .get_mut(&plan_id)
            .ok_or(PlanError::NotFound(plan_id))?;
        let abandoned = matches!(plan.state, PlanState::Abandoned { .. });
        let total = plan.steps.len();
        let step = plan
            .steps
            .get_mut(step_index)
            .ok_or(PlanError::NotFound(plan_id))?;

        if !result.status.is_advancing() {
            validate_transition(step.status, StepStatus::Failed)?;
            let reason = result.message().to_string();
            step.status = StepStatus::Failed;
            step.result = Some(result);
            if abandoned {
                return Ok(Progress::Abandoned);
            }
            plan.state = PlanState::Halted { step_index };
            tracing::warn!(plan_id = %plan_id, step_index, reason = %reason, "Plan halted");
            return Ok(Progress::Halted { step_index, reason });
        }

        validate_transition(step.status, StepStatus::Executed)?;
        step.status = StepStatus::Executed;
        step.result = Some(result);

        if abandoned {
            return Ok(Progress::Abandoned);
        }
        if step_index + 1 < total {
            return self.surface(plan_id, step_index + 1, now).map(Progress::Next);
        }

        plan.state = PlanState::Completed;
        tracing::info!(plan_id = %plan_id, steps = total, "Plan completed");
        Ok(Progress::Completed)
    }

    /// Decline a pending action; the plan is abandoned.
    pub fn reject(&mut self, action_id: Uuid) -> Result<Dropped, PlanError> {
        let pending = self
            .gate
            .take(action_id)
            .ok_or(PlanError::UnknownConfirmation(action_id))?;
        self.drop_step(&pending)
    }

    /// Abandon a plan, destroying its pending action if any.
    pub fn abandon(&mut self, plan_id: Uuid) -> Result<PlanSnapshot, PlanError> {
        let state = self
            .plans
            .get(&plan_id)
            .map(|p| p.state)
            .ok_or(PlanError::NotFound(plan_id))?;

        match state {
            PlanState::AwaitingConfirmation { .. } => {
                if let Some(pending) = self.gate.remove_for_plan(plan_id) {
                    self.drop_step(&pending)?;
                }
            }
            PlanState::Executing { step_index } => {
                // The in-flight step finishes on its own; nothing new is surfaced.
                if let Some(plan) = self.plans.get_mut(&plan_id) {
                    plan.state = PlanState::Abandoned { step_index };
                }
            }
            PlanState::Completed | PlanState::Halted { .. } | PlanState::Abandoned { .. } => {
                return Err(PlanError::AlreadyFinished(plan_id));
            }
        }

        tracing::info!(plan_id = %plan_id, "Plan abandoned");
        self.snapshot(plan_id)
    }

    /// Reject every pending action whose deadline has passed.
    pub fn expire(&mut self, now: Instant) -> Vec<Dropped> {
        self.gate
            .drain_expired(now)
            .iter()
            .filter_map(|pending| match self.drop_step(pending) {
                Ok(dropped) => Some(dropped),
                Err(e) => {
                    tracing::warn!(action_id = %pending.action_id, error = %e, "Failed to expire pending action");
                    None
                }
            })
            .collect()
    }

    /// Forget terminal plans that finished more than the retention ago.
    ///
    /// A plan's clock starts the first time this call sees it terminal, so
    /// with a periodic caller eviction lags by at most one period.
    pub fn evict_finished(&mut self, now: Instant) -> usize {
        for plan in self.plans.values().filter(|p| p.is_terminal()) {
            self.finished.entry(plan.plan_id).or_insert(now);
        }

        let retention = self.retention;
        let stale: Vec<Uuid> = self
            .finished
            .iter()
            .filter(|(_, ended)| now.duration_since(**ended) >= retention)
            .map(|(id, _)| *id)
            .collect();
        for plan_id in &stale {
            self.finished.remove(plan_id);
            self.plans.remove(plan_id);
            tracing::debug!(plan_id = %plan_id, "Evicted finished plan");
        }
        stale.len()
    }

    pub fn snapshot(&self, plan_id: Uuid) -> Result<PlanSnapshot, PlanError> {
        self.plans
            .get(&plan_id)
            .map(PlanSnapshot::from)
            .ok_or(PlanError::NotFound(plan_id))
    }

    /// All plans, newest first.
    pub fn list(&self) -> Vec<PlanSnapshot> {
        let mut plans: Vec<PlanSnapshot> = self.plans.values().map(PlanSnapshot::from).collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        plans
    }

    pub fn pending(&self, action_id: Uuid) -> Option<&PendingAction> {
        self.gate.get(action_id)
    }

    pub fn pending_count(&self) -> usize {
        self.gate.pending_count()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    fn surface(
        &mut self,
        plan_id: Uuid,
        step_index: usize,
        now: Instant,
    ) -> Result<PendingAction, PlanError> {
        let plan = self
            .plans
            .get_mut(&plan_id)
            .ok_or(PlanError::NotFound(plan_id))?;
        let step = &plan.steps[step_index];

        let pending = PendingAction {
            action_id: Uuid::new_v4(),
            plan_id,
            step_index,
            execution_payload: StepSpec::new(step.action_name.clone(), step.raw_params.clone()),
            created_at: Timestamp::now(),
            expires_at: now + self.timeout,
        };
        plan.state = PlanState::AwaitingConfirmation {
            action_id: pending.action_id,
            step_index,
        };
        self.gate.insert(pending.clone());

        tracing::debug!(plan_id = %plan_id, step_index, action_id = %pending.action_id, "Step awaiting confirmation");
        Ok(pending)
    }

    /// Mark a consumed pending step rejected and abandon its plan.
    fn drop_step(&mut self, pending: &PendingAction) -> Result<Dropped, PlanError> {
        let plan = self
            .plans
            .get_mut(&pending.plan_id)
            .ok_or(PlanError::NotFound(pending.plan_id))?;
        let step = &mut plan.steps[pending.step_index];
        validate_transition(step.status, StepStatus::Rejected)?;
        step.status = StepStatus::Rejected;
        plan.state = PlanState::Abandoned {
            step_index: pending.step_index,
        };
        Ok(Dropped {
            plan_id: pending.plan_id,
            step_index: pending.step_index,
        })
    }
}
