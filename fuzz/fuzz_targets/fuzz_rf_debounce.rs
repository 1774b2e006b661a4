//! Fuzz target: `RfDebouncer::ingest`
//!
//! Each 13-byte chunk is one decoded frame: code (8), bit length (1),
//! gap since the previous frame in ms (4). Checks:
//! - frames under 24 bits are never accepted
//! - accepted frames are at least 100 ms apart
//! - the ledger never exceeds its capacity
//!
//! cargo fuzz run fuzz_rf_debounce

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartswitch::app::debounce::{IngestOutcome, RfDebouncer, LEDGER_CAPACITY};
use smartswitch::app::ports::RfEvent;
use smartswitch::config::DebounceConfig;

fuzz_target!(|data: &[u8]| {
    let mut debouncer = RfDebouncer::new(&DebounceConfig::default());
    let mut now = 0u64;
    let mut last_accepted: Option<u64> = None;

    for chunk in data.chunks_exact(13) {
        let mut code = [0u8; 8];
        code.copy_from_slice(&chunk[..8]);
        let mut gap = [0u8; 4];
        gap.copy_from_slice(&chunk[9..13]);
        now = now.saturating_add(u64::from(u32::from_le_bytes(gap) % 5_000));

        let event = RfEvent {
            code: u64::from_le_bytes(code),
            bit_length: u32::from(chunk[8] % 65),
            observed_at_ms: now,
        };
        let outcome = debouncer.ingest(&event);

        if event.bit_length < 24 {
            assert_eq!(outcome, IngestOutcome::RejectedShort);
        }
        if outcome.is_accepted() {
            if let Some(prev) = last_accepted {
                assert!(now - prev >= 100, "accepted inside the global window");
            }
            last_accepted = Some(now);
        }
        assert!(debouncer.tracked_codes() <= LEDGER_CAPACITY);
    }
});
