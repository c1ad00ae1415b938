//! Core library for the `loadrun` CLI.
//!
//! Time-boxed HTTP load runs: a target validator that refuses internal
//! addresses, a run orchestrator that owns each run's lifecycle, lock-free
//! latency aggregation, and a periodic sampler that builds each run's time
//! series. The `loadrun` binary is a thin front end over these pieces.
pub mod args;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod orchestrator;
pub mod repository;
pub mod runtime;
pub mod summary;
pub mod target;
