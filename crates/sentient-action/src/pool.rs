//! Fixed-size worker pool.
//!
//! N persistent workers drain one shared FIFO queue. Every submitted unit of
//! work gets a [`TaskHandle`] that resolves to its output, or to a
//! [`PoolError`] if the unit panicked. Workers survive task panics.

use crate::error::PoolError;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Environment variable that overrides the configured pool size.
pub const POOL_SIZE_ENV: &str = "SENTIENT_POOL_SIZE";

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

enum Envelope {
    Run(Job),
    /// Poison value; one is sent per worker on stop.
    Shutdown,
}

/// Lifecycle of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    Idle,
    Running,
    Stopped,
}

/// Point-in-time view of the pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub size: usize,
    pub state: PoolState,
    pub queued: u64,
    pub running: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    queued: AtomicU64,
    running: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

struct Inner {
    state: PoolState,
    sender: Option<mpsc::UnboundedSender<Envelope>>,
    workers: Vec<JoinHandle<()>>,
}

/// Handle to a submitted unit of work.
///
/// Awaiting it yields the task output. Dropping it is fine; the task still
/// runs to completion.
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, PoolError>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PoolError::Dropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Bounded concurrent task executor.
pub struct WorkerPool {
    size: usize,
    counters: Arc<Counters>,
    inner: Mutex<Inner>,
}

impl WorkerPool {
    /// Create an idle pool with `size` workers (minimum 1).
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            counters: Arc::new(Counters::default()),
            inner: Mutex::new(Inner {
                state: PoolState::Idle,
                sender: None,
                workers: Vec::new(),
            }),
        }
    }

    /// Create a pool sized from config, honouring `SENTIENT_POOL_SIZE`.
    pub fn from_config(configured: usize) -> Self {
        Self::new(resolve_pool_size(configured))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn state(&self) -> PoolState {
        self.lock_inner().state
    }

    /// Spin up the workers. No-op if already running; restarts a stopped pool.
    pub fn start(&self) {
        let mut inner = self.lock_inner();
        self.start_locked(&mut inner);
    }

    /// Enqueue a unit of work.
    ///
    /// Auto-starts an idle pool. Refused once the pool has been stopped.
    pub fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut inner = self.lock_inner();
        match inner.state {
            PoolState::Stopped => return Err(PoolError::Stopped),
            PoolState::Idle => self.start_locked(&mut inner),
            PoolState::Running => {}
        }

        let (tx, rx) = oneshot::channel();
        let counters = Arc::clone(&self.counters);
        let job: Job = Box::pin(async move {
            counters.running.fetch_add(1, Ordering::SeqCst);
            let outcome = tokio::spawn(task).await;
            counters.running.fetch_sub(1, Ordering::SeqCst);

            let result = match outcome {
                Ok(value) => {
                    counters.completed.fetch_add(1, Ordering::SeqCst);
                    Ok(value)
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    if e.is_panic() {
                        let message = panic_message(e.into_panic());
                        tracing::warn!(error = %message, "Pool task panicked");
                        Err(PoolError::TaskPanicked(message))
                    } else {
                        Err(PoolError::Dropped)
                    }
                }
            };
            // Receiver may have been dropped; the task still counts.
            let _ = tx.send(result);
        });

        let sender = inner.sender.as_ref().ok_or(PoolError::Stopped)?;
        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        sender
            .send(Envelope::Run(job))
            .map_err(|_| PoolError::Stopped)?;

        Ok(TaskHandle { rx })
    }

    /// Refuse new work, drain the queue, and wait for every worker to exit.
    pub async fn stop(&self) {
        let workers = {
            let mut inner = self.lock_inner();
            if inner.state != PoolState::Running {
                inner.state = PoolState::Stopped;
                return;
            }
            inner.state = PoolState::Stopped;
            if let Some(sender) = inner.sender.take() {
                for _ in 0..inner.workers.len() {
                    let _ = sender.send(Envelope::Shutdown);
                }
            }
            std::mem::take(&mut inner.workers)
        };

        for worker in workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "Pool worker exited abnormally");
            }
        }
        tracing::info!(size = self.size, "Worker pool stopped");
    }

    /// Snapshot the counters. `completed + failed <= queued` always holds.
    pub fn stats(&self) -> PoolStats {
        // Finished counts are read before queued; queued is bumped before a
        // task can finish.
        let completed = self.counters.completed.load(Ordering::SeqCst);
        let failed = self.counters.failed.load(Ordering::SeqCst);
        let running = self.counters.running.load(Ordering::SeqCst);
        let queued = self.counters.queued.load(Ordering::SeqCst);
        PoolStats {
            size: self.size,
            state: self.state(),
            queued,
            running,
            completed,
            failed,
        }
    }

    fn start_locked(&self, inner: &mut Inner) {
        if inner.state == PoolState::Running {
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel::<Envelope>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        inner.workers = (0..self.size)
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&rx))))
            .collect();
        inner.sender = Some(tx);
        inner.state = PoolState::Running;
        tracing::info!(size = self.size, "Worker pool started");
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn worker_loop(id: usize, rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Envelope>>>) {
    loop {
        let envelope = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        match envelope {
            Some(Envelope::Run(job)) => job.await,
            Some(Envelope::Shutdown) | None => break,
        }
    }
    tracing::debug!(worker = id, "Pool worker exiting");
}

/// Pick the pool size: a valid `SENTIENT_POOL_SIZE` wins over config.
pub fn resolve_pool_size(configured: usize) -> usize {
    parse_pool_size(std::env::var(POOL_SIZE_ENV).ok().as_deref()).unwrap_or(configured.max(1))
}

fn parse_pool_size(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
