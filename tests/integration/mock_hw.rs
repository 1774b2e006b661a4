//! Mock board, storage and event sink for integration tests.
//!
//! Records every output call so tests can assert on the full history
//! without touching real GPIO registers. The network and broker side
//! uses the adapters' own simulation backends.

use std::collections::{HashMap, VecDeque};

use smartswitch::app::events::{AppEvent, RestartReason};
use smartswitch::app::ports::{
    EventSink, IndicatorPort, ResetGesture, ResetInputPort, RfEvent, RfReceiverPort, StoragePort,
    SwitchOutputPort, SystemPort,
};
use smartswitch::app::switch_bank::SwitchId;
use smartswitch::drivers::button::HoldDetector;
use smartswitch::error::StorageError;

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub outputs: [bool; 4],
    pub output_calls: Vec<(SwitchId, bool)>,
    pub link_up: bool,
    /// Flash counts in call order.
    pub flashes: Vec<u8>,
    pub restarts: Vec<RestartReason>,
    pub button_pressed: bool,
    pub rf_queue: VecDeque<RfEvent>,
    reset: HoldDetector,
    rng_state: u32,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            outputs: [false; 4],
            output_calls: Vec::new(),
            link_up: false,
            flashes: Vec::new(),
            restarts: Vec::new(),
            button_pressed: false,
            rf_queue: VecDeque::new(),
            reset: HoldDetector::new(5_000),
            rng_state: 0x1234,
        }
    }

    pub fn push_rf(&mut self, code: u64, bit_length: u32, at_ms: u64) {
        self.rf_queue.push_back(RfEvent {
            code,
            bit_length,
            observed_at_ms: at_ms,
        });
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchOutputPort for MockBoard {
    fn set_output(&mut self, id: SwitchId, on: bool) {
        self.outputs[id.index()] = on;
        self.output_calls.push((id, on));
    }
}

impl IndicatorPort for MockBoard {
    fn set_link_up(&mut self, up: bool) {
        self.link_up = up;
    }

    fn flash(&mut self, _now_ms: u64, count: u8) {
        self.flashes.push(count);
    }

    fn refresh(&mut self, _now_ms: u64) {}
}

impl ResetInputPort for MockBoard {
    fn poll_reset(&mut self, now_ms: u64) -> Option<ResetGesture> {
        self.reset.update(now_ms, self.button_pressed)
    }
}

impl SystemPort for MockBoard {
    fn restart(&mut self, reason: RestartReason) {
        self.restarts.push(reason);
    }

    fn random_u32(&mut self) -> u32 {
        // xorshift32
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        x
    }
}

impl RfReceiverPort for MockBoard {
    fn take_sample(&mut self) -> Option<RfEvent> {
        self.rf_queue.pop_front()
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.store.get(&format!("{}::{}", namespace, key)).map(Vec::as_slice)
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.raw(namespace, key) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.store.insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }

    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError> {
        let prefix = format!("{}::", namespace);
        self.store.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
