use thiserror::Error;

use crate::target::TargetBlockReason;

/// Typed rejection raised when a target fails SSRF validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}: {detail}")]
pub struct TargetRejected {
    pub reason: TargetBlockReason,
    pub detail: String,
}

impl TargetRejected {
    #[must_use]
    pub fn new(reason: TargetBlockReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}
