//! Per-run execution state and the shared plumbing that tracks it.
mod context;
mod pool;
mod registry;
mod sampler;


pub use context::RunContext;
pub use pool::WorkerPool;
pub use registry::RunRegistry;
pub use sampler::{DEFAULT_SAMPLE_INTERVAL, Sampler};
