//! Fuzz target: `Command::parse`
//!
//! Feeds arbitrary UTF-8 payloads to the broker command parser and checks
//! that anything it accepts re-renders to exactly the input.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartswitch::app::commands::Command;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Some(command) = Command::parse(text) {
        let canonical = match command {
            Command::SetSwitch(id, on) => format!("sw{}:{}", id.number(), u8::from(on)),
            Command::SetAll(on) => format!("sw1234:{}", u8::from(on)),
            Command::Ping => "ping".to_string(),
        };
        assert_eq!(canonical, text, "parser accepted a non-canonical payload");
    }
});
