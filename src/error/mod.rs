mod app;
mod config;
mod repository;
mod run;
mod target;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use repository::RepositoryError;
pub use run::RunError;
pub use target::TargetRejected;
pub use validation::ValidationError;
