use thiserror::Error;

use super::{ConfigError, RepositoryError, RunError, TargetRejected, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("HTTP client error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("Target rejected: {0}")]
    Target(#[from] TargetRejected),
    #[error("Run error: {0}")]
    Run(#[from] RunError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn run<E>(error: E) -> Self
    where
        E: Into<RunError>,
    {
        error.into().into()
    }

    pub fn repository<E>(error: E) -> Self
    where
        E: Into<RepositoryError>,
    {
        error.into().into()
    }

    /// True when the error means a definition or run does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::Run(RunError::DefinitionNotFound { .. } | RunError::RunNotFound { .. })
        )
    }

    /// The SSRF rejection carried by this error, if any.
    #[must_use]
    pub const fn target_rejection(&self) -> Option<&TargetRejected> {
        match self {
            AppError::Target(rejected) => Some(rejected),
            AppError::Io { .. }
            | AppError::Clap { .. }
            | AppError::Json { .. }
            | AppError::Reqwest { .. }
            | AppError::Join { .. }
            | AppError::Run(_)
            | AppError::Repository(_)
            | AppError::Validation(_)
            | AppError::Config(_) => None,
        }
    }
}
