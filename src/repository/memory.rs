use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::{DefinitionId, RunId, RunSample, TestDefinition, TestReport, TestRun};
use crate::error::{AppError, AppResult, RepositoryError};

use super::{
    AllowedTargetRepository, DefinitionRepository, ReportRepository, RunRepository,
    SampleRepository,
};

fn read<'lock, T>(
    lock: &'lock RwLock<T>,
    store: &'static str,
) -> AppResult<RwLockReadGuard<'lock, T>> {
    lock.read()
        .map_err(|_poisoned| AppError::repository(RepositoryError::LockPoisoned { store }))
}

fn write<'lock, T>(
    lock: &'lock RwLock<T>,
    store: &'static str,
) -> AppResult<RwLockWriteGuard<'lock, T>> {
    lock.write()
        .map_err(|_poisoned| AppError::repository(RepositoryError::LockPoisoned { store }))
}

#[derive(Debug, Default)]
pub struct InMemoryDefinitionRepository {
    definitions: RwLock<HashMap<DefinitionId, TestDefinition>>,
}

#[async_trait]
impl DefinitionRepository for InMemoryDefinitionRepository {
    async fn save(&self, definition: TestDefinition) -> AppResult<DefinitionId> {
        let id = definition.id;
        write(&self.definitions, "definition")?.insert(id, definition);
        Ok(id)
    }

    async fn find_by_id(&self, id: DefinitionId) -> AppResult<Option<TestDefinition>> {
        Ok(read(&self.definitions, "definition")?.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<TestDefinition>> {
        Ok(read(&self.definitions, "definition")?
            .values()
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRunRepository {
    runs: RwLock<HashMap<RunId, TestRun>>,
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn save(&self, run: TestRun) -> AppResult<()> {
        let mut runs = write(&self.runs, "run")?;
        if runs.contains_key(&run.run_id) {
            return Err(AppError::repository(RepositoryError::DuplicateRun {
                run_id: run.run_id,
            }));
        }
        runs.insert(run.run_id, run);
        Ok(())
    }

    async fn find_by_id(&self, run_id: RunId) -> AppResult<Option<TestRun>> {
        Ok(read(&self.runs, "run")?.get(&run_id).cloned())
    }

    async fn update(&self, run: TestRun) -> AppResult<()> {
        write(&self.runs, "run")?.insert(run.run_id, run);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReportRepository {
    reports: RwLock<HashMap<RunId, TestReport>>,
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn save(&self, run_id: RunId, report: TestReport) -> AppResult<()> {
        write(&self.reports, "report")?.insert(run_id, report);
        Ok(())
    }

    async fn find_by_run_id(&self, run_id: RunId) -> AppResult<Option<TestReport>> {
        Ok(read(&self.reports, "report")?.get(&run_id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySampleRepository {
    samples: RwLock<HashMap<RunId, Vec<RunSample>>>,
}

#[async_trait]
impl SampleRepository for InMemorySampleRepository {
    async fn append(&self, sample: RunSample) -> AppResult<()> {
        write(&self.samples, "sample")?
            .entry(sample.run_id)
            .or_default()
            .push(sample);
        Ok(())
    }

    async fn find_by_run_id(&self, run_id: RunId) -> AppResult<Vec<RunSample>> {
        Ok(read(&self.samples, "sample")?
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Allow-list kept in memory; an empty list allows nothing.
#[derive(Debug, Default)]
pub struct InMemoryAllowedTargets {
    hosts: RwLock<Vec<String>>,
}

impl InMemoryAllowedTargets {
    #[must_use]
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: RwLock::new(hosts.into_iter().map(Into::into).collect()),
        }
    }

    /// Adds one host to the allow-list.
    ///
    /// # Errors
    ///
    /// Returns an error if the allow-list lock is poisoned.
    pub fn allow(&self, host: impl Into<String>) -> AppResult<()> {
        write(&self.hosts, "allowed target")?.push(host.into());
        Ok(())
    }
}

#[async_trait]
impl AllowedTargetRepository for InMemoryAllowedTargets {
    async fn allowed_hosts(&self) -> AppResult<Vec<String>> {
        Ok(read(&self.hosts, "allowed target")?.clone())
    }
}
