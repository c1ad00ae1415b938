use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::{DefinitionId, RequestMetricEvent, RunId, TestReport};
use crate::metrics::MetricsAggregator;

use super::WorkerPool;

/// Everything a run needs while it is active.
///
/// The aggregator and worker pool belong to this context alone; workers only
/// reach them through the shared `Arc<RunContext>`.
#[derive(Debug)]
pub struct RunContext {
    run_id: RunId,
    definition_id: DefinitionId,
    deadline: Instant,
    aggregator: MetricsAggregator,
    pool: WorkerPool,
    cancel_tx: watch::Sender<bool>,
    finalization_claimed: AtomicBool,
    pinned_addrs: Vec<SocketAddr>,
}

impl RunContext {
    #[must_use]
    pub fn new(
        run_id: RunId,
        definition_id: DefinitionId,
        deadline: Instant,
        pool_size: usize,
        pinned_addrs: Vec<SocketAddr>,
    ) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            run_id,
            definition_id,
            deadline,
            aggregator: MetricsAggregator::new(),
            pool: WorkerPool::new(run_id, pool_size),
            cancel_tx,
            finalization_claimed: AtomicBool::new(false),
            pinned_addrs,
        }
    }

    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub const fn definition_id(&self) -> DefinitionId {
        self.definition_id
    }

    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    #[must_use]
    pub const fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    #[must_use]
    pub const fn aggregator(&self) -> &MetricsAggregator {
        &self.aggregator
    }

    /// Addresses the target resolved to when it was validated.
    #[must_use]
    pub fn pinned_addrs(&self) -> &[SocketAddr] {
        &self.pinned_addrs
    }

    pub fn record(&self, event: RequestMetricEvent) {
        self.aggregator.record(event);
    }

    #[must_use]
    pub fn snapshot(&self) -> TestReport {
        self.aggregator.snapshot()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Workers keep issuing requests only while this holds.
    #[must_use]
    pub fn should_continue(&self) -> bool {
        !self.is_cancelled() && !self.is_expired()
    }

    /// Raises the cooperative cancellation flag.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut cancel_rx = self.cancel_tx.subscribe();
        if cancel_rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// One-shot token deciding which of stop and natural completion owns the
    /// terminal transition. Only the first caller gets `true`.
    #[must_use]
    pub fn claim_finalization(&self) -> bool {
        self.finalization_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Cancels and tears down the worker pool.
    pub fn shutdown(&self) {
        self.cancel();
        self.pool.shutdown();
    }
}
