//! Value types shared by the orchestrator, metrics, and repositories.
mod definition;
mod event;
mod report;
mod run;


pub use definition::{DefinitionId, TestDefinition};
pub use event::RequestMetricEvent;
pub use report::{RunSample, RunView, TestReport, TimeSeriesPoint, time_series};
pub use run::{RunId, RunStatus, TestRun};
