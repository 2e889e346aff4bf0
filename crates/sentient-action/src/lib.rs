//! Action pipeline for Sentient.
//!
//! Turns multi-step plans into gated, paced, deduplicated desktop actions:
//! the orchestrator surfaces one step at a time for confirmation, the bridge
//! carries confirmed steps to the executor, and the executor resolves and
//! performs them behind the safety lock.

pub mod bridge;
pub mod channel;
pub mod confirmation;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod plan;
pub mod policy;
pub mod pool;
pub mod resolver;
pub mod sweeper;
pub mod types;

pub use bridge::{ActionBridge, ActionGateway, GatewayOutcome, HttpBridge, LocalBridge};
pub use channel::{BroadcastChannel, PushChannel};
pub use confirmation::ConfirmationGate;
pub use error::{ActionError, BridgeError, PlanError, PoolError};
pub use executor::audit::{AuditLog, AuditRecord};
pub use executor::desktop::{Desktop, HeadlessDesktop, SystemDesktop};
pub use executor::handler::{ActionHandler, ActionRegistry};
pub use executor::safety::SafetyLock;
pub use executor::Executor;
pub use orchestrator::Orchestrator;
pub use plan::PlanBook;
pub use policy::{ActionPolicy, AutonomySwitch};
pub use pool::{PoolStats, WorkerPool};
pub use resolver::Resolver;
pub use sweeper::Sweeper;
pub use types::{
    CanonicalAction, PendingAction, Plan, PlanSnapshot, PlanState, Step, StepSpec, StepStatus,
};
