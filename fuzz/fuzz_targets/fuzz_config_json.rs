//! Fuzz target: `SystemConfig::from_json`
//!
//! Arbitrary bytes through the build-time config parser and validator.
//! Neither may panic; a config that validates must keep its bounded
//! strings intact.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartswitch::config::SystemConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = SystemConfig::from_json(text) else {
        return;
    };
    if config.validate().is_ok() {
        assert!(!config.broker.host.is_empty());
        assert!(config.broker.port != 0);
    }
});
