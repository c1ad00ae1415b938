use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::{RunId, TestReport, TestRun};
use crate::error::{AppError, AppResult, RunError};

use super::Inner;

impl Inner {
    pub(super) async fn require_run(&self, run_id: RunId) -> AppResult<TestRun> {
        self.repositories
            .runs
            .find_by_id(run_id)
            .await?
            .ok_or_else(|| AppError::run(RunError::RunNotFound { id: run_id }))
    }

    pub(super) async fn stop_run(&self, run_id: RunId) -> AppResult<()> {
        let run = self.require_run(run_id).await?;
        if !run.is_running() {
            debug!(run_id = %run_id, status = %run.status(), "Stop ignored, run already ended");
            return Ok(());
        }
        let Some(context) = self.registry.get(run_id) else {
            debug!(run_id = %run_id, "Stop ignored, run context already released");
            return Ok(());
        };
        if !context.claim_finalization() {
            debug!(run_id = %run_id, "Stop ignored, completion is finalizing the run");
            return Ok(());
        }

        let report = context.snapshot();
        context.cancel();
        let persisted = self.persist_terminal(run_id, report, TestRun::stop).await;
        self.release(run_id);
        persisted?;
        info!(run_id = %run_id, "Run stopped");
        Ok(())
    }

    /// Natural end of a run. A run already claimed by `stop` is left alone.
    pub(super) async fn finish_run_done(&self, run_id: RunId) -> AppResult<()> {
        let Some(context) = self.registry.get(run_id) else {
            return Ok(());
        };
        if !context.claim_finalization() {
            return Ok(());
        }

        let report = context.snapshot();
        let persisted = self.persist_terminal(run_id, report, TestRun::finish).await;
        self.release(run_id);
        persisted?;
        info!(run_id = %run_id, "Run completed");
        Ok(())
    }

    async fn persist_terminal(
        &self,
        run_id: RunId,
        report: TestReport,
        transition: fn(&TestRun, DateTime<Utc>) -> Option<TestRun>,
    ) -> AppResult<()> {
        let total_requests = report.total_requests;
        self.repositories.reports.save(run_id, report).await?;

        // the stored record may have moved on since the caller looked
        let run = self.require_run(run_id).await?;
        let Some(ended) = transition(&run, Utc::now()) else {
            debug!(run_id = %run_id, status = %run.status(), "Run already ended, status kept");
            return Ok(());
        };
        debug!(run_id = %run_id, total_requests, status = %ended.status(), "Final report saved");
        self.repositories.runs.update(ended).await
    }

    /// Sampler cancellation, registry removal, and pool teardown. Safe to
    /// call more than once.
    fn release(&self, run_id: RunId) {
        self.sampler.stop(run_id);
        if let Some(context) = self.registry.remove(run_id) {
            context.shutdown();
            debug!(run_id = %run_id, "Run context released");
        }
    }
}
