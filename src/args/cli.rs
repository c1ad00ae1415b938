use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use super::parsers::{parse_duration_secs, parse_port, parse_positive_u32, parse_positive_u64};
use super::types::{PositiveU32, PositiveU64};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Time-boxed HTTP load runs with live metrics, stop control, and an SSRF guard on every target."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (TOML or JSON); defaults to ./loadrun.toml or ./loadrun.json
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Enable debug logging (overridden by LOADRUN_LOG or RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Start a load run, print progress per sample, and report when it ends
    Run(RunArgs),
    /// Check whether a target URL would be allowed, without sending traffic
    Validate(ValidateArgs),
}

/// Allow-list additions on top of the config file.
#[derive(Debug, Args, Clone, Default)]
pub struct TargetArgs {
    /// Host the run may target (repeatable)
    #[arg(long = "allow-host")]
    pub allow_hosts: Vec<String>,

    /// Port the run may target (repeatable); any port when none are given
    #[arg(long = "allow-port", value_parser = parse_port)]
    pub allow_ports: Vec<u16>,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Target URL
    #[arg(long, short, conflicts_with = "definition")]
    pub url: Option<String>,

    /// Id of a definition from the config file
    #[arg(long)]
    pub definition: Option<Uuid>,

    /// Concurrent virtual users
    #[arg(long = "vus", default_value = "1", value_parser = parse_positive_u32)]
    pub virtual_users: PositiveU32,

    /// Run length (30, 30s, 2m, 1h)
    #[arg(long, short, default_value = "10", value_parser = parse_duration_secs)]
    pub duration: Duration,

    /// Milliseconds between time-series samples
    #[arg(long = "sample-interval-ms", value_parser = parse_positive_u64)]
    pub sample_interval_ms: Option<PositiveU64>,

    /// Per-request timeout in milliseconds
    #[arg(long = "request-timeout-ms", value_parser = parse_positive_u64)]
    pub request_timeout_ms: Option<PositiveU64>,

    #[command(flatten)]
    pub targets: TargetArgs,

    /// Print the final view and time series as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ValidateArgs {
    /// URL to check
    pub url: String,

    #[command(flatten)]
    pub targets: TargetArgs,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,
}
