use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{store} store lock poisoned")]
    LockPoisoned { store: &'static str },
    #[error("Run {run_id} already exists.")]
    DuplicateRun { run_id: uuid::Uuid },
}
