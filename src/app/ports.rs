//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (relays, LED, radio, network, broker, storage, event
//! sinks) implement these traits. The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use core::net::Ipv4Addr;

use super::events::{AppEvent, RestartReason};
use super::switch_bank::SwitchId;
use crate::error::{BrokerError, ConnectivityError, StorageError};

// ───────────────────────────────────────────────────────────────
// Hardware ports (driven adapter: domain → board)
// ───────────────────────────────────────────────────────────────

/// Drives the relay outputs.
pub trait SwitchOutputPort {
    fn set_output(&mut self, id: SwitchId, on: bool);
}

/// Status indicator (single LED).
///
/// `flash` starts a short non-blocking blink pattern; `refresh` advances
/// it and must be called every tick.
pub trait IndicatorPort {
    /// Steady level: on while the broker session is up.
    fn set_link_up(&mut self, up: bool);

    /// Blink `count` times starting at `now_ms`.
    fn flash(&mut self, now_ms: u64, count: u8);

    fn refresh(&mut self, now_ms: u64);
}

/// Progress of the hold-to-confirm network reset gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetGesture {
    /// Trigger went active; the hold timer started.
    Armed,
    /// Released before the hold completed. Nothing happens.
    Cancelled,
    /// Held for the full confirmation time.
    Confirmed,
}

/// Manual network-reset input.
pub trait ResetInputPort {
    /// Sample the trigger and report a gesture transition, if any.
    fn poll_reset(&mut self, now_ms: u64) -> Option<ResetGesture>;
}

/// Whole-device services: restart and hardware entropy.
pub trait SystemPort {
    /// Reboot the device. On hardware this does not return.
    fn restart(&mut self, reason: RestartReason);

    fn random_u32(&mut self) -> u32;
}

/// One decoded 433 MHz transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RfEvent {
    pub code: u64,
    pub bit_length: u32,
    /// Monotonic milliseconds since boot.
    pub observed_at_ms: u64,
}

/// Read-side port for the RF receiver.
pub trait RfReceiverPort {
    /// Take the oldest pending sample, if any. Consumes it.
    fn take_sample(&mut self) -> Option<RfEvent>;
}

// ───────────────────────────────────────────────────────────────
// Network link port
// ───────────────────────────────────────────────────────────────

/// Link details reported by `ping` and the heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    pub ssid: heapless::String<32>,
    pub address: Option<Ipv4Addr>,
    pub rssi: Option<i8>,
}

/// Wireless station link.
pub trait NetworkPort {
    /// Start (or restart) association with the configured access point.
    /// Returns immediately; completion is observed through `is_connected`.
    fn begin(&mut self) -> Result<(), ConnectivityError>;

    fn is_connected(&self) -> bool;

    fn info(&self) -> NetworkInfo;

    /// Forget every credential the link layer has stored.
    fn erase_credentials(&mut self) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Broker session port
// ───────────────────────────────────────────────────────────────

/// One message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<96>,
    pub payload: heapless::String<64>,
}

/// Publish/subscribe transport.
pub trait BrokerPort {
    /// Open a session with `client_id`. `Ok` means the CONNECT was issued;
    /// it may complete later, as reported by `is_connected`.
    fn connect(&mut self, client_id: &str) -> Result<(), BrokerError>;

    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError>;

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError>;

    /// Oldest undelivered inbound message, if any.
    fn poll_inbound(&mut self) -> Option<InboundMessage>;

    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - `write` is durable when it returns `Ok` (value and commit together).
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value and commit it.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;

    /// Remove every key in `namespace`.
    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError>;
}
