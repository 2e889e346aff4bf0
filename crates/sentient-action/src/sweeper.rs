//! Background expiry of unanswered confirmations.

use crate::orchestrator::Orchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Periodically rejects pending actions whose confirmation window closed.
pub struct Sweeper {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl Sweeper {
    pub fn new(orchestrator: Arc<Orchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval: interval.max(Duration::from_millis(100)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Sweep every `interval` until [`Sweeper::shutdown`] is called.
    pub async fn run(&self) {
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "Confirmation sweeper started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    let expired = self.orchestrator.sweep_expired();
                    if expired > 0 {
                        tracing::info!(expired, "Expired pending confirmations");
                    }
                }
                _ = self.shutdown.notified() => {
                    tracing::debug!("Confirmation sweeper stopped");
                    return;
                }
            }
        }
    }

    /// Signal the loop to exit. A signal sent before `run` starts is kept.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ActionGateway, LocalBridge};
    use crate::channel::BroadcastChannel;
    use crate::executor::desktop::HeadlessDesktop;
    use crate::executor::Executor;
    use crate::policy::{ActionPolicy, AutonomySwitch};
    use crate::pool::WorkerPool;
    use crate::types::{PlanState, StepSpec};
    use sentient_core::config::SentientConfig;
    use sentient_core::types::AutonomyMode;
    use serde_json::json;

    fn orchestrator(timeout_secs: u64) -> Arc<Orchestrator> {
        let mut config = SentientConfig::default();
        config.confirmation.timeout_secs = timeout_secs;
        let executor = Arc::new(Executor::new(&config, Arc::new(HeadlessDesktop::default())));
        let gateway = Arc::new(ActionGateway::new(
            Arc::new(AutonomySwitch::new(AutonomyMode::Simulated)),
            ActionPolicy::default(),
            Arc::new(LocalBridge::new(executor)),
        ));
        Arc::new(Orchestrator::new(
            &config,
            gateway,
            Arc::new(WorkerPool::new(1)),
            Arc::new(BroadcastChannel::default()),
        ))
    }

    #[tokio::test]
    async fn test_sweeper_shutdown() {
        let sweeper = Sweeper::new(orchestrator(300), Duration::from_secs(5));
        sweeper.shutdown();

        tokio::time::timeout(Duration::from_secs(2), sweeper.run())
            .await
            .expect("Sweeper should shut down within timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_expires_pending_action() {
        let orch = orchestrator(10);
        let pending = orch
            .create_plan(vec![StepSpec::new("CLICK", json!(null))], "user")
            .unwrap();

        let sweeper = Arc::new(Sweeper::new(Arc::clone(&orch), Duration::from_secs(1)));
        let task = {
            let sweeper = Arc::clone(&sweeper);
            tokio::spawn(async move { sweeper.run().await })
        };

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(orch.pending_count(), 0);
        assert_eq!(
            orch.snapshot(pending.plan_id).unwrap().state,
            PlanState::Abandoned { step_index: 0 }
        );

        sweeper.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_leaves_fresh_actions() {
        let orch = orchestrator(300);
        orch.create_plan(vec![StepSpec::new("CLICK", json!(null))], "user")
            .unwrap();

        let sweeper = Arc::new(Sweeper::new(Arc::clone(&orch), Duration::from_secs(1)));
        let task = {
            let sweeper = Arc::clone(&sweeper);
            tokio::spawn(async move { sweeper.run().await })
        };
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(orch.pending_count(), 1);

        sweeper.shutdown();
        task.await.unwrap();
    }
}
