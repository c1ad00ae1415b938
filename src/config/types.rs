use serde::Deserialize;
use uuid::Uuid;

/// Contents of `loadrun.toml` / `loadrun.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub sample_interval_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub allowed_hosts: Option<Vec<String>>,
    pub allowed_ports: Option<Vec<u16>>,
    pub definitions: Option<Vec<DefinitionConfig>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DefinitionConfig {
    pub id: Option<Uuid>,
    pub url: Option<String>,
    #[serde(alias = "virtual_users")]
    pub vus: Option<u32>,
    /// Seconds.
    pub duration: Option<u64>,
}
