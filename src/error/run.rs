use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Test definition not found: {id}")]
    DefinitionNotFound { id: Uuid },
    #[error("Test run not found: {id}")]
    RunNotFound { id: Uuid },
    #[error("Failed to launch executor for run {run_id}: {message}")]
    ExecutorLaunch { run_id: Uuid, message: String },
}
