use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DefinitionId;
use crate::error::ValidationError;

pub type RunId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Done,
    Stopped,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Done => "DONE",
            RunStatus::Stopped => "STOPPED",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One execution of a definition.
///
/// Values are never edited in place: every transition builds a new `TestRun`
/// and replaces the stored one. `ended_at` is set exactly when the status is
/// terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRun")]
pub struct TestRun {
    pub run_id: RunId,
    pub definition_id: DefinitionId,
    status: RunStatus,
    pub started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct StoredRun {
    run_id: RunId,
    definition_id: DefinitionId,
    status: RunStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl TryFrom<StoredRun> for TestRun {
    type Error = ValidationError;

    fn try_from(stored: StoredRun) -> Result<Self, Self::Error> {
        if stored.status.is_terminal() != stored.ended_at.is_some() {
            return Err(ValidationError::RunEndMismatch {
                status: stored.status.as_str(),
            });
        }
        Ok(Self {
            run_id: stored.run_id,
            definition_id: stored.definition_id,
            status: stored.status,
            started_at: stored.started_at,
            ended_at: stored.ended_at,
        })
    }
}

impl TestRun {
    #[must_use]
    pub const fn started(
        run_id: RunId,
        definition_id: DefinitionId,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            definition_id,
            status: RunStatus::Running,
            started_at,
            ended_at: None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.status, RunStatus::Running)
    }

    /// RUNNING -> DONE. `None` when the run already ended.
    #[must_use]
    pub fn finish(&self, ended_at: DateTime<Utc>) -> Option<Self> {
        self.end(RunStatus::Done, ended_at)
    }

    /// RUNNING -> STOPPED. `None` when the run already ended.
    #[must_use]
    pub fn stop(&self, ended_at: DateTime<Utc>) -> Option<Self> {
        self.end(RunStatus::Stopped, ended_at)
    }

    fn end(&self, status: RunStatus, ended_at: DateTime<Utc>) -> Option<Self> {
        if !self.is_running() {
            return None;
        }
        Some(Self {
            run_id: self.run_id,
            definition_id: self.definition_id,
            status,
            started_at: self.started_at,
            ended_at: Some(ended_at),
        })
    }
}
