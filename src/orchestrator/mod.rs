//! Run control: start, stop, status, report, and time series.
mod lifecycle;


use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    DefinitionId, RunId, RunSample, RunView, TestReport, TestRun, TimeSeriesPoint, time_series,
};
use crate::error::{AppError, AppResult, RunError};
use crate::executor::{Completion, LoadExecutor};
use crate::repository::RunRepositories;
use crate::runtime::{DEFAULT_SAMPLE_INTERVAL, RunContext, RunRegistry, Sampler};
use crate::target::TargetValidator;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub sample_interval: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

struct Inner {
    repositories: RunRepositories,
    validator: Arc<TargetValidator>,
    executor: Arc<dyn LoadExecutor>,
    registry: Arc<RunRegistry>,
    sampler: Sampler,
}

/// Owns the run lifecycle.
///
/// Cheap to clone; clones share the same registry and sampler. Must be built
/// inside a tokio runtime.
#[derive(Clone)]
pub struct RunOrchestrator {
    inner: Arc<Inner>,
}

impl RunOrchestrator {
    #[must_use]
    pub fn new(
        repositories: RunRepositories,
        validator: Arc<TargetValidator>,
        executor: Arc<dyn LoadExecutor>,
        settings: OrchestratorSettings,
    ) -> Self {
        let registry = Arc::new(RunRegistry::new());
        let sampler = Sampler::spawn(
            Arc::clone(&registry),
            Arc::clone(&repositories.samples),
            settings.sample_interval,
        );
        Self {
            inner: Arc::new(Inner {
                repositories,
                validator,
                executor,
                registry,
                sampler,
            }),
        }
    }

    #[must_use]
    pub fn repositories(&self) -> &RunRepositories {
        &self.inner.repositories
    }

    /// Ids of runs whose context is still registered.
    #[must_use]
    pub fn active_runs(&self) -> Vec<RunId> {
        self.inner.registry.run_ids()
    }

    #[must_use]
    pub fn is_active(&self, run_id: RunId) -> bool {
        self.inner.registry.contains(run_id)
    }

    #[must_use]
    pub fn is_sampling(&self, run_id: RunId) -> bool {
        self.inner.sampler.is_sampling(run_id)
    }

    /// Starts a run of the given definition and returns its id without
    /// waiting for the run to finish.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionNotFound` for an unknown definition,
    /// `TargetRejected` when the target fails validation, or the executor's
    /// launch error.
    pub async fn start(&self, definition_id: DefinitionId) -> AppResult<RunId> {
        let inner = &self.inner;
        let definition = inner
            .repositories
            .definitions
            .find_by_id(definition_id)
            .await?
            .ok_or(RunError::DefinitionNotFound { id: definition_id })?;

        let pinned_addrs = match inner.validator.validate_or_reject(&definition.target_url).await {
            Ok(addrs) => addrs,
            Err(rejected) => {
                warn!(
                    definition_id = %definition_id,
                    reason = %rejected.reason,
                    detail = %rejected.detail,
                    "Target rejected, run not started"
                );
                return Err(rejected.into());
            }
        };

        let run_id = Uuid::new_v4();
        inner
            .repositories
            .runs
            .save(TestRun::started(run_id, definition_id, Utc::now()))
            .await?;

        let deadline = Instant::now()
            .checked_add(definition.effective_duration())
            .unwrap_or_else(Instant::now);
        let context = Arc::new(RunContext::new(
            run_id,
            definition_id,
            deadline,
            definition.pool_size(),
            pinned_addrs,
        ));
        if !inner.registry.insert(Arc::clone(&context)) {
            return Err(AppError::run(RunError::ExecutorLaunch {
                run_id,
                message: "run id already registered".to_owned(),
            }));
        }
        inner.sampler.start(run_id).await;

        let (completion, done_rx) = Completion::channel(run_id);
        let watcher = Arc::clone(inner);
        tokio::spawn(async move {
            if done_rx.await.is_err() {
                warn!(run_id = %run_id, "Executor dropped its completion signal");
            }
            if let Err(err) = watcher.finish_run_done(run_id).await {
                error!(run_id = %run_id, "Failed to finalize run: {}", err);
            }
        });

        if let Err(err) = inner.executor.execute(&definition, context, completion) {
            error!(run_id = %run_id, "Executor failed to launch: {}", err);
            return Err(err);
        }

        info!(
            run_id = %run_id,
            definition_id = %definition_id,
            target = %definition.target_url,
            virtual_users = definition.pool_size(),
            duration_secs = definition.effective_duration().as_secs(),
            "Run started"
        );
        Ok(run_id)
    }

    /// Current run record.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` for an unknown run.
    pub async fn status(&self, run_id: RunId) -> AppResult<TestRun> {
        self.inner.require_run(run_id).await
    }

    /// Live snapshot while the run is active, the persisted final report
    /// afterwards, and an empty report when neither exists.
    ///
    /// # Errors
    ///
    /// Returns an error only if the report store fails.
    pub async fn report(&self, run_id: RunId) -> AppResult<TestReport> {
        if let Some(context) = self.inner.registry.get(run_id) {
            return Ok(context.snapshot());
        }
        Ok(self
            .inner
            .repositories
            .reports
            .find_by_run_id(run_id)
            .await?
            .unwrap_or_default())
    }

    /// Run record plus its current report.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` for an unknown run.
    pub async fn view(&self, run_id: RunId) -> AppResult<RunView> {
        let run = self.status(run_id).await?;
        let report = self.report(run_id).await?;
        Ok(RunView { run, report })
    }

    /// Stops a running run. Stopping a finished run does nothing.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` for an unknown run.
    pub async fn stop(&self, run_id: RunId) -> AppResult<()> {
        self.inner.stop_run(run_id).await
    }

    /// Samples in append order; kept after the run ends.
    ///
    /// # Errors
    ///
    /// Returns an error only if the sample store fails.
    pub async fn time_series(&self, run_id: RunId) -> AppResult<Vec<RunSample>> {
        self.inner
            .repositories
            .samples
            .find_by_run_id(run_id)
            .await
    }

    /// Samples with throughput and failure rate derived.
    ///
    /// # Errors
    ///
    /// Returns an error only if the sample store fails.
    pub async fn time_series_points(&self, run_id: RunId) -> AppResult<Vec<TimeSeriesPoint>> {
        let samples = self.time_series(run_id).await?;
        Ok(time_series(&samples))
    }

    /// Stops every active run.
    ///
    /// # Errors
    ///
    /// Returns the first stop failure; every run is still attempted.
    pub async fn stop_all(&self) -> AppResult<()> {
        let mut first_error = None;
        for run_id in self.active_runs() {
            if let Err(err) = self.stop(run_id).await {
                warn!(run_id = %run_id, "Failed to stop run: {}", err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
