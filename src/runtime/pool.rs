use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

use crate::domain::RunId;

/// Bounded set of virtual-user tasks for one run.
///
/// At most `size` workers execute at once; shutting the pool down refuses new
/// work and aborts whatever is still running.
#[derive(Debug)]
pub struct WorkerPool {
    run_id: RunId,
    size: usize,
    permits: Arc<Semaphore>,
    workers: Mutex<Vec<AbortHandle>>,
    closed: AtomicBool,
}

impl WorkerPool {
    #[must_use]
    pub fn new(run_id: RunId, size: usize) -> Self {
        let size = size.max(1);
        Self {
            run_id,
            size,
            permits: Arc::new(Semaphore::new(size)),
            workers: Mutex::new(Vec::with_capacity(size)),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Spawns a worker. Returns `None` once the pool is shut down.
    pub fn spawn<F>(&self, worker: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shutdown() {
            return None;
        }
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            worker.await;
        });

        let abort = handle.abort_handle();
        self.lock_workers().push(abort.clone());
        // shutdown may have drained the list between the check and the push
        if self.is_shutdown() {
            abort.abort();
        }
        Some(handle)
    }

    /// Refuses new work and aborts running workers. Returns `false` when the
    /// pool was already shut down.
    pub fn shutdown(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.permits.close();
        let workers = std::mem::take(&mut *self.lock_workers());
        let aborted = workers.iter().filter(|worker| !worker.is_finished()).count();
        for worker in workers {
            worker.abort();
        }
        debug!(run_id = %self.run_id, aborted, "Worker pool shut down");
        true
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<AbortHandle>> {
        match self.workers.lock() {
            Ok(workers) => workers,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
