//! Storage seams the orchestrator depends on, plus in-memory stores.
mod memory;


use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DefinitionId, RunId, RunSample, TestDefinition, TestReport, TestRun};
use crate::error::AppResult;

pub use memory::{
    InMemoryAllowedTargets, InMemoryDefinitionRepository, InMemoryReportRepository,
    InMemoryRunRepository, InMemorySampleRepository,
};

#[async_trait]
pub trait DefinitionRepository: Send + Sync {
    async fn save(&self, definition: TestDefinition) -> AppResult<DefinitionId>;
    async fn find_by_id(&self, id: DefinitionId) -> AppResult<Option<TestDefinition>>;
    async fn find_all(&self) -> AppResult<Vec<TestDefinition>>;
}

#[async_trait]
pub trait RunRepository: Send + Sync {
    async fn save(&self, run: TestRun) -> AppResult<()>;
    async fn find_by_id(&self, run_id: RunId) -> AppResult<Option<TestRun>>;
    /// Replaces the stored value as a whole.
    async fn update(&self, run: TestRun) -> AppResult<()>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn save(&self, run_id: RunId, report: TestReport) -> AppResult<()>;
    async fn find_by_run_id(&self, run_id: RunId) -> AppResult<Option<TestReport>>;
}

#[async_trait]
pub trait SampleRepository: Send + Sync {
    async fn append(&self, sample: RunSample) -> AppResult<()>;
    /// Samples in append order.
    async fn find_by_run_id(&self, run_id: RunId) -> AppResult<Vec<RunSample>>;
}

#[async_trait]
pub trait AllowedTargetRepository: Send + Sync {
    async fn allowed_hosts(&self) -> AppResult<Vec<String>>;
}

/// The stores a run orchestrator is composed from.
#[derive(Clone)]
pub struct RunRepositories {
    pub definitions: Arc<dyn DefinitionRepository>,
    pub runs: Arc<dyn RunRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub samples: Arc<dyn SampleRepository>,
}

impl RunRepositories {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            definitions: Arc::new(InMemoryDefinitionRepository::default()),
            runs: Arc::new(InMemoryRunRepository::default()),
            reports: Arc::new(InMemoryReportRepository::default()),
            samples: Arc::new(InMemorySampleRepository::default()),
        }
    }
}
