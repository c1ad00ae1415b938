//! The contract for whatever actually drives traffic, plus an HTTP driver.
mod http;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::domain::{RunId, TestDefinition};
use crate::error::AppResult;
use crate::runtime::RunContext;

pub use http::{HttpExecutor, HttpExecutorSettings};

/// Drives virtual users for one run.
///
/// `execute` must return promptly; the work itself runs in the background
/// until the context's deadline passes or it is cancelled, recording one
/// event per request into the context. `completion` is fired once when that
/// work ends, whatever the outcome.
pub trait LoadExecutor: Send + Sync {
    /// Launches the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be launched. The completion signal
    /// is dropped in that case, which still finalizes the run.
    fn execute(
        &self,
        definition: &TestDefinition,
        context: Arc<RunContext>,
        completion: Completion,
    ) -> AppResult<()>;
}

/// Single-use signal that an executor's work for a run has ended.
///
/// Dropping it without calling [`Completion::complete`] counts as completion
/// too, so a panicking executor still lets the run finalize.
#[derive(Debug)]
pub struct Completion {
    run_id: RunId,
    done_tx: oneshot::Sender<()>,
}

impl Completion {
    pub(crate) fn channel(run_id: RunId) -> (Self, oneshot::Receiver<()>) {
        let (done_tx, done_rx) = oneshot::channel();
        (Self { run_id, done_tx }, done_rx)
    }

    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn complete(self) {
        drop(self.done_tx.send(()));
    }
}
