//! Configuration loading and resolution into runtime settings.
mod loader;
pub mod types;


use std::time::Duration;

use url::Url;

use crate::domain::TestDefinition;
use crate::error::{AppError, AppResult, ConfigError};
use crate::runtime::DEFAULT_SAMPLE_INTERVAL;

use types::{ConfigFile, DefinitionConfig};

pub use loader::{DEFAULT_CONFIG_FILES, load_config};

#[cfg(test)]
pub(crate) use loader::load_config_file;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_VIRTUAL_USERS: u32 = 1;
pub const DEFAULT_DURATION_SECS: u64 = 10;

/// Validated settings a run is wired from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub sample_interval: Duration,
    pub request_timeout: Duration,
    pub allowed_hosts: Vec<String>,
    /// Empty means any port.
    pub allowed_ports: Vec<u16>,
    pub definitions: Vec<TestDefinition>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            allowed_hosts: Vec::new(),
            allowed_ports: Vec::new(),
            definitions: Vec::new(),
        }
    }
}

impl Settings {
    /// Resolves a parsed config file, applying defaults and checking values.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for zero intervals, blank allow-list entries,
    /// or definitions without a parseable url.
    pub fn from_config(config: ConfigFile) -> AppResult<Self> {
        let mut settings = Self::default();
        if let Some(ms) = config.sample_interval_ms {
            settings.sample_interval = positive_millis("sample_interval_ms", ms)?;
        }
        if let Some(ms) = config.request_timeout_ms {
            settings.request_timeout = positive_millis("request_timeout_ms", ms)?;
        }
        if let Some(hosts) = config.allowed_hosts {
            settings.allowed_hosts = allowed_hosts(hosts)?;
        }
        if let Some(ports) = config.allowed_ports {
            settings.allowed_ports = ports;
        }
        if let Some(definitions) = config.definitions {
            settings.definitions = definitions
                .into_iter()
                .enumerate()
                .map(|(index, definition)| resolve_definition(index, definition))
                .collect::<AppResult<Vec<_>>>()?;
        }
        Ok(settings)
    }

    /// Loads the config file (explicit path or default location) and
    /// resolves it; defaults when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, parsed, or resolved.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        load_config(path)?.map_or_else(|| Ok(Self::default()), Self::from_config)
    }
}

fn positive_millis(field: &'static str, ms: u64) -> AppResult<Duration> {
    if ms == 0 {
        return Err(AppError::config(ConfigError::FieldTooSmall { field, min: 1 }));
    }
    Ok(Duration::from_millis(ms))
}

fn allowed_hosts(hosts: Vec<String>) -> AppResult<Vec<String>> {
    hosts
        .into_iter()
        .enumerate()
        .map(|(index, host)| {
            let host = host.trim().to_ascii_lowercase();
            if host.is_empty() {
                return Err(AppError::config(ConfigError::BlankAllowedHost { index }));
            }
            Ok(host)
        })
        .collect()
}

fn resolve_definition(index: usize, definition: DefinitionConfig) -> AppResult<TestDefinition> {
    let url = definition
        .url
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| AppError::config(ConfigError::DefinitionMissingUrl { index }))?;
    // syntax only; the target validator decides reachability at start
    if let Err(err) = Url::parse(&url) {
        return Err(AppError::config(ConfigError::InvalidDefinitionUrl {
            index,
            url,
            source: err,
        }));
    }

    let mut resolved = TestDefinition::new(
        url,
        definition.vus.unwrap_or(DEFAULT_VIRTUAL_USERS),
        definition.duration.unwrap_or(DEFAULT_DURATION_SECS),
    );
    if let Some(id) = definition.id {
        resolved.id = id;
    }
    Ok(resolved)
}
