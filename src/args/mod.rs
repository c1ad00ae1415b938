//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;
mod types;


pub use cli::{CliArgs, Command, RunArgs, TargetArgs, ValidateArgs};
pub use types::{PositiveU32, PositiveU64};
