use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::debug;
use url::{Host, Url};

use crate::error::TargetRejected;
use crate::repository::AllowedTargetRepository;

use super::{HostResolver, TargetBlockReason, ValidationResult, is_blocked_address};

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Decides whether a URL may be load tested.
///
/// Hosts are default-deny: only names listed by the allowed-target repository
/// pass, and even those are refused when any resolved address is internal.
pub struct TargetValidator {
    allowed_targets: Arc<dyn AllowedTargetRepository>,
    allowed_ports: HashSet<u16>,
    resolver: Arc<dyn HostResolver>,
}

impl TargetValidator {
    #[must_use]
    pub fn new(
        allowed_targets: Arc<dyn AllowedTargetRepository>,
        allowed_ports: impl IntoIterator<Item = u16>,
        resolver: Arc<dyn HostResolver>,
    ) -> Self {
        Self {
            allowed_targets,
            allowed_ports: allowed_ports.into_iter().collect(),
            resolver,
        }
    }

    /// Like [`TargetValidator::validate`], but blocked targets become errors.
    ///
    /// # Errors
    ///
    /// Returns `TargetRejected` carrying the block reason and detail.
    pub async fn validate_or_reject(&self, raw_url: &str) -> Result<Vec<SocketAddr>, TargetRejected> {
        self.validate(raw_url).await.into_result()
    }

    pub async fn validate(&self, raw_url: &str) -> ValidationResult {
        let result = self.check(raw_url).await;
        if let Some(reason) = result.reason {
            debug!(url = raw_url, %reason, detail = %result.detail, "Target blocked");
        }
        result
    }

    async fn check(&self, raw_url: &str) -> ValidationResult {
        let trimmed = raw_url.trim();
        if trimmed.is_empty() {
            return ValidationResult::block(TargetBlockReason::EmptyUrl, "url is empty");
        }

        if has_empty_authority(trimmed) {
            return classify_empty_host(trimmed);
        }

        let url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(url::ParseError::EmptyHost) => return classify_empty_host(trimmed),
            Err(url::ParseError::RelativeUrlWithoutBase) if is_uri_text(trimmed) => {
                return ValidationResult::block(TargetBlockReason::SchemeNotAllowed, "scheme=");
            }
            Err(err) => return ValidationResult::block(TargetBlockReason::InvalidUrl, err.to_string()),
        };

        let scheme = url.scheme().to_ascii_lowercase();
        if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
            return ValidationResult::block(
                TargetBlockReason::SchemeNotAllowed,
                format!("scheme={}", scheme),
            );
        }

        if !url.username().is_empty() || url.password().is_some() {
            return ValidationResult::block(
                TargetBlockReason::UserinfoNotAllowed,
                "userinfo present",
            );
        }

        let Some(host) = host_of(&url) else {
            return ValidationResult::block(TargetBlockReason::MissingHost, "host is missing");
        };

        let allowed_hosts = match self.allowed_targets.allowed_hosts().await {
            Ok(hosts) => normalize_hosts(hosts),
            Err(err) => {
                return ValidationResult::block(
                    TargetBlockReason::HostNotAllowed,
                    format!("allow-list unavailable: {}", err),
                );
            }
        };
        if !allowed_hosts.contains(&host) {
            return ValidationResult::block(
                TargetBlockReason::HostNotAllowed,
                format!("host={}", host),
            );
        }

        let Some(port) = url.port_or_known_default() else {
            return ValidationResult::block(TargetBlockReason::PortNotAllowed, "port=unknown");
        };
        if !self.allowed_ports.is_empty() && !self.allowed_ports.contains(&port) {
            return ValidationResult::block(
                TargetBlockReason::PortNotAllowed,
                format!("port={}", port),
            );
        }

        let resolved = match self.resolver.resolve(&host, port).await {
            Ok(addrs) if !addrs.is_empty() => addrs,
            Ok(_) => {
                return ValidationResult::block(
                    TargetBlockReason::DnsLookupFailed,
                    format!("no addresses for {}", host),
                );
            }
            Err(err) => {
                return ValidationResult::block(TargetBlockReason::DnsLookupFailed, err.to_string());
            }
        };

        if let Some(blocked) = resolved.iter().find(|addr| is_blocked_address(addr.ip())) {
            return ValidationResult::block(
                TargetBlockReason::PrivateAddressBlocked,
                format!("resolved={}", blocked.ip()),
            );
        }

        ValidationResult::allow("ok", resolved)
    }
}

/// Lower-cased host without IPv6 brackets.
fn host_of(url: &Url) -> Option<String> {
    let host = match url.host()? {
        Host::Domain(domain) => domain.trim().to_ascii_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };
    if host.is_empty() { None } else { Some(host) }
}

fn normalize_hosts(hosts: Vec<String>) -> HashSet<String> {
    hosts
        .into_iter()
        .map(|host| host.trim().to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}

/// True when `raw_url` names a scheme but no host follows it, as in
/// `http:///path` or `http:path`. The WHATWG parser would lift the first
/// path segment into the host for those.
fn has_empty_authority(raw_url: &str) -> bool {
    let Some((scheme, rest)) = raw_url.split_once(':') else {
        return false;
    };
    if !is_scheme(scheme) {
        return false;
    }
    rest.strip_prefix("//")
        .is_none_or(|authority| authority.is_empty() || authority.starts_with(['/', '?', '#']))
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Scheme-less references such as `api.example.com/health` are well-formed
/// URIs; anything with characters a URI cannot carry stays invalid.
fn is_uri_text(raw_url: &str) -> bool {
    raw_url
        .chars()
        .all(|c| c.is_ascii_graphic() && !matches!(c, '"' | '<' | '>' | '\\' | '^' | '`' | '{' | '|' | '}'))
}

/// `http://` and friends fail to parse for lack of a host; keep the
/// scheme check ahead of the host check for them.
fn classify_empty_host(raw_url: &str) -> ValidationResult {
    let scheme = raw_url
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .unwrap_or_default();
    if ALLOWED_SCHEMES.contains(&scheme.as_str()) {
        ValidationResult::block(TargetBlockReason::MissingHost, "host is missing")
    } else {
        ValidationResult::block(
            TargetBlockReason::SchemeNotAllowed,
            format!("scheme={}", scheme),
        )
    }
}
