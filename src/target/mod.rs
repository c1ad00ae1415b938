//! SSRF gate consulted before any traffic is sent for a run.
mod address;
mod resolver;
mod validator;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::TargetRejected;

pub use address::is_blocked_address;
pub use resolver::{HostResolver, SystemResolver};
pub use validator::TargetValidator;

/// Why a target URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetBlockReason {
    EmptyUrl,
    InvalidUrl,
    SchemeNotAllowed,
    UserinfoNotAllowed,
    MissingHost,
    HostNotAllowed,
    PortNotAllowed,
    DnsLookupFailed,
    PrivateAddressBlocked,
}

impl TargetBlockReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetBlockReason::EmptyUrl => "EMPTY_URL",
            TargetBlockReason::InvalidUrl => "INVALID_URL",
            TargetBlockReason::SchemeNotAllowed => "SCHEME_NOT_ALLOWED",
            TargetBlockReason::UserinfoNotAllowed => "USERINFO_NOT_ALLOWED",
            TargetBlockReason::MissingHost => "MISSING_HOST",
            TargetBlockReason::HostNotAllowed => "HOST_NOT_ALLOWED",
            TargetBlockReason::PortNotAllowed => "PORT_NOT_ALLOWED",
            TargetBlockReason::DnsLookupFailed => "DNS_LOOKUP_FAILED",
            TargetBlockReason::PrivateAddressBlocked => "PRIVATE_ADDRESS_BLOCKED",
        }
    }
}

impl std::fmt::Display for TargetBlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one target.
///
/// An allowed result carries the addresses the host resolved to, so the
/// executor can connect to exactly what was checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub allowed: bool,
    pub reason: Option<TargetBlockReason>,
    pub detail: String,
    #[serde(skip)]
    pub resolved: Vec<SocketAddr>,
}

impl ValidationResult {
    #[must_use]
    pub fn allow(detail: impl Into<String>, resolved: Vec<SocketAddr>) -> Self {
        Self {
            allowed: true,
            reason: None,
            detail: detail.into(),
            resolved,
        }
    }

    #[must_use]
    pub fn block(reason: TargetBlockReason, detail: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            detail: detail.into(),
            resolved: Vec::new(),
        }
    }

    /// Resolved addresses when allowed, the typed rejection otherwise.
    ///
    /// # Errors
    ///
    /// Returns `TargetRejected` when the target was blocked.
    pub fn into_result(self) -> Result<Vec<SocketAddr>, TargetRejected> {
        match self.reason {
            Some(reason) if !self.allowed => Err(TargetRejected::new(reason, self.detail)),
            Some(_) | None => Ok(self.resolved),
        }
    }
}
