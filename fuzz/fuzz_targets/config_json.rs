#![no_main]

use libfuzzer_sys::fuzz_target;
use loadrun::config::Settings;
use loadrun::config::types::ConfigFile;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<ConfigFile>(data) else {
        return;
    };
    if let Ok(settings) = Settings::from_config(config) {
        debug_assert!(!settings.sample_interval.is_zero());
        debug_assert!(settings.allowed_hosts.iter().all(|host| !host.is_empty()));
        debug_assert!(settings.definitions.iter().all(|definition| !definition.target_url.is_empty()));
    }
});
