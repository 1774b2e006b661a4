//! Two-tier RF debounce.
//!
//! Remotes repeat a code many times per button press, and independent
//! transmitters can collide within a few milliseconds. Samples pass
//! through three gates, in order:
//!
//! | Gate      | Rejects when                                           |
//! |-----------|--------------------------------------------------------|
//! | length    | `bit_length < min_bit_length`                          |
//! | global    | `observed_at - last_accepted(any code) < global`       |
//! | per-code  | `observed_at - last_accepted(this code) <= per_code`   |
//!
//! Only accepted samples update the ledger. The ledger holds at most
//! [`LEDGER_CAPACITY`] codes and evicts the least recently accepted one.

use heapless::FnvIndexMap;

use super::ports::RfEvent;
use crate::config::DebounceConfig;

/// Distinct codes tracked by the per-code gate.
pub const LEDGER_CAPACITY: usize = 32;

/// Verdict for one RF sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted,
    /// Partial or malformed capture.
    RejectedShort,
    /// Too close to the previous accepted sample of any code.
    RejectedGlobal,
    /// Too close to the previous accepted sample of the same code.
    RejectedPerCode,
}

impl IngestOutcome {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

pub struct RfDebouncer {
    min_bit_length: u32,
    global_window_ms: u64,
    per_code_window_ms: u64,
    last_global_ms: Option<u64>,
    ledger: FnvIndexMap<u64, u64, LEDGER_CAPACITY>,
}

impl RfDebouncer {
    pub fn new(config: &DebounceConfig) -> Self {
        Self {
            min_bit_length: config.min_bit_length,
            global_window_ms: u64::from(config.global_window_ms),
            per_code_window_ms: u64::from(config.per_code_window_ms),
            last_global_ms: None,
            ledger: FnvIndexMap::new(),
        }
    }

    /// Classify `event` and record it if accepted. Never blocks.
    pub fn ingest(&mut self, event: &RfEvent) -> IngestOutcome {
        if event.bit_length < self.min_bit_length {
            return IngestOutcome::RejectedShort;
        }

        let now = event.observed_at_ms;
        if let Some(last) = self.last_global_ms {
            if now.saturating_sub(last) < self.global_window_ms {
                return IngestOutcome::RejectedGlobal;
            }
        }

        if let Some(&last) = self.ledger.get(&event.code) {
            if now.saturating_sub(last) <= self.per_code_window_ms {
                return IngestOutcome::RejectedPerCode;
            }
        }

        self.record(event.code, now);
        IngestOutcome::Accepted
    }

    /// Number of codes currently tracked.
    pub fn tracked_codes(&self) -> usize {
        self.ledger.len()
    }

    /// Whether `code` is still in the ledger.
    pub fn remembers(&self, code: u64) -> bool {
        self.ledger.contains_key(&code)
    }

    fn record(&mut self, code: u64, now: u64) {
        self.last_global_ms = Some(now);
        if let Some(slot) = self.ledger.get_mut(&code) {
            *slot = now;
            return;
        }
        if self.ledger.len() == LEDGER_CAPACITY {
            let oldest = self
                .ledger
                .iter()
                .min_by_key(|&(_, &at)| at)
                .map(|(&code, _)| code);
            if let Some(oldest) = oldest {
                self.ledger.remove(&oldest);
            }
        }
        // Cannot fail: a slot was freed above if the map was full.
        let _ = self.ledger.insert(code, now);
    }
}
