#![no_main]

use libfuzzer_sys::fuzz_target;
use loadrun::config::Settings;
use loadrun::config::types::ConfigFile;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = toml::from_str::<ConfigFile>(input) else {
        return;
    };
    if let Ok(settings) = Settings::from_config(config) {
        debug_assert!(!settings.request_timeout.is_zero());
        for definition in &settings.definitions {
            debug_assert!(definition.pool_size() >= 1);
            debug_assert!(definition.effective_duration().as_secs() >= 1);
        }
    }
});
