//! Worker pool draining the VIP queue
//!
//! # Design
//!
//! Each worker is a tokio task that loops:
//!
//! ```text
//! pop ── Some(entry) ──> spawn_blocking(execute) ──> queue.complete()
//!  │
//!  └─── None ──> sleep(idle_poll) or cancellation
//! ```
//!
//! An empty queue never blocks a worker indefinitely; it re-polls after
//! `idle_poll`, so newly queued commands are picked up promptly. The engine
//! only cancels the workers once the queue is idle, so no queued command is
//! dropped.

use super::priority_queue::{VipEntry, VipQueue};
use crate::core::CommandExecutor;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Bounded pool of VIP workers
#[derive(Clone)]
pub struct PriorityScheduler {
    queue: Arc<VipQueue>,
    executor: Arc<dyn CommandExecutor>,
    idle_poll: Duration,
}

impl PriorityScheduler {
    /// Create a scheduler over `queue`
    ///
    /// # Arguments
    ///
    /// * `queue` - Shared VIP queue the router pushes into
    /// * `executor` - Runs each dequeued command as a regular one
    /// * `idle_poll` - Sleep between polls of an empty queue
    pub fn new(
        queue: Arc<VipQueue>,
        executor: Arc<dyn CommandExecutor>,
        idle_poll: Duration,
    ) -> Self {
        Self {
            queue,
            executor,
            idle_poll,
        }
    }

    /// Spawn `count` workers into `tasks`; they stop when `cancel` fires
    pub fn spawn_workers(&self, count: usize, cancel: &CancellationToken, tasks: &mut JoinSet<()>) {
        for worker in 0..count {
            let scheduler = self.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move { scheduler.run_worker(worker, cancel).await });
        }
    }

    async fn execute(&self, worker: usize, entry: VipEntry) {
        tracing::debug!(
            worker,
            atm = entry.atm,
            priority = entry.priority,
            command = %entry.command.raw,
            "Dequeued VIP command"
        );

        let executor = Arc::clone(&self.executor);
        let outcome =
            tokio::task::spawn_blocking(move || executor.execute(entry.atm, &entry.command)).await;
        self.queue.complete();

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => tracing::debug!(worker, %error, "VIP command failed"),
            Err(error) => tracing::error!(worker, %error, "VIP command panicked"),
        }
    }

    async fn run_worker(self, worker: usize, cancel: CancellationToken) {
        tracing::debug!(worker, "VIP worker started");

        while !cancel.is_cancelled() {
            match self.queue.pop() {
                Some(entry) => self.execute(worker, entry).await,
                None => tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.idle_poll) => {}
                },
            }
        }

        tracing::debug!(worker, "VIP worker stopped");
    }
}
