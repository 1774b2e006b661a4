//! System configuration parameters
//!
//! All tunable parameters for the SmartSwitch system. Defaults match the
//! production board; a JSON document baked in at build time through the
//! `SMARTSWITCH_CONFIG` environment variable overrides any subset of them,
//! and network credentials stored in NVS override the compiled ones.

use serde::{Deserialize, Serialize};

use crate::app::debounce::LEDGER_CAPACITY;
use crate::app::ports::StoragePort;
use crate::error::{Error, Result, StorageError};
use crate::identity::OUTBOUND_TOPIC_CAPACITY;

/// NVS namespace for network credentials; wiped by the manual reset.
pub const CREDENTIAL_NAMESPACE: &str = "auth";
/// Key of the postcard-encoded [`StoredCredentials`] record.
pub const WIFI_CREDENTIAL_KEY: &str = "wifi";

const MAX_CREDENTIAL_BLOB: usize = 128;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub network: NetworkConfig,
    pub broker: BrokerConfig,
    pub identity: DeviceIdentity,
    pub retry: RetryPolicy,
    pub debounce: DebounceConfig,

    // --- Timing ---
    /// Heartbeat publish interval (milliseconds); also reported by `ping`.
    pub heartbeat_interval_ms: u32,
    /// How long the reset input must stay asserted (milliseconds).
    pub reset_hold_ms: u32,
    /// Main loop sleep between ticks (milliseconds).
    pub loop_interval_ms: u32,
    /// Task watchdog timeout (milliseconds).
    pub watchdog_timeout_ms: u32,
}

/// Station-mode credentials compiled into the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_password: String,
}

/// MQTT broker endpoint and topic layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Prefix of the randomised per-attempt client id.
    pub client_id_prefix: String,
    /// Outbound status/telemetry topic.
    pub publish_topic: String,
    /// Base of the inbound command topic; the device id is appended.
    pub subscribe_topic: String,
    pub heartbeat_topic: String,
}

/// Parts of the fixed device identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceIdentity {
    pub work_package: String,
    pub gateway_type: String,
    /// Firmware build date, `YYMMDD`.
    pub firmware_date: String,
    pub device_serial: String,
}

/// Bounded reconnection policy for the network link and broker session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Link polls per connection cycle.
    pub wifi_attempt_count: u32,
    pub wifi_attempt_interval_ms: u32,
    /// Passive polls after the active window before the cycle counts as failed.
    pub wifi_wait_count: u32,
    pub wifi_wait_interval_ms: u32,
    /// Failed cycles tolerated before restarting.
    pub wifi_cycle_budget: u32,
    /// Refill the cycle budget whenever the link comes back up.
    pub restore_cycle_budget_on_success: bool,
    /// Broker CONNECT attempts before restarting.
    pub broker_attempt_count: u32,
    pub broker_attempt_interval_ms: u32,
}

/// RF noise rejection thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Frames shorter than this are partial captures.
    pub min_bit_length: u32,
    /// Minimum spacing between any two accepted frames.
    pub global_window_ms: u32,
    /// Minimum spacing between two accepted frames with the same code.
    pub per_code_window_ms: u32,
}

/// Station credentials persisted by provisioning; override the compiled ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl StoredCredentials {
    pub fn load(storage: &impl StoragePort) -> core::result::Result<Self, StorageError> {
        let mut buf = [0u8; MAX_CREDENTIAL_BLOB];
        let len = storage.read(CREDENTIAL_NAMESPACE, WIFI_CREDENTIAL_KEY, &mut buf)?;
        postcard::from_bytes(&buf[..len]).map_err(|_| StorageError::Corrupted)
    }

    pub fn save(&self, storage: &mut impl StoragePort) -> core::result::Result<(), StorageError> {
        let mut buf = [0u8; MAX_CREDENTIAL_BLOB];
        let bytes = postcard::to_slice(self, &mut buf).map_err(|_| StorageError::Full)?;
        storage.write(CREDENTIAL_NAMESPACE, WIFI_CREDENTIAL_KEY, bytes)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            broker: BrokerConfig::default(),
            identity: DeviceIdentity::default(),
            retry: RetryPolicy::default(),
            debounce: DebounceConfig::default(),

            // Timing
            heartbeat_interval_ms: 5 * 60 * 1000, // 5 min
            reset_hold_ms: 5000,
            loop_interval_ms: 10,
            watchdog_timeout_ms: 10_000,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: "DMA-IR-Bluster".into(),
            wifi_password: "dmabd987".into(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "broker2.dma-bd.com".into(),
            port: 1883,
            username: "broker2".into(),
            password: "Secret!@#$1234".into(),
            client_id_prefix: "dma_ssw_".into(),
            publish_topic: "DMA/SmartSwitch/PUB".into(),
            subscribe_topic: "DMA/SmartSwitch/SUB".into(),
            heartbeat_topic: "DMA/SmartSwitch/HB".into(),
        }
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            work_package: "1225".into(),
            gateway_type: "10".into(),
            firmware_date: "250212".into(),
            device_serial: "0006".into(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            wifi_attempt_count: 60,
            wifi_attempt_interval_ms: 1000,
            wifi_wait_count: 60,
            wifi_wait_interval_ms: 1000,
            wifi_cycle_budget: 2,
            restore_cycle_budget_on_success: false,
            broker_attempt_count: 10,
            broker_attempt_interval_ms: 5000,
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            min_bit_length: 24,
            global_window_ms: 100,
            per_code_window_ms: 2000,
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON configuration"))
    }

    /// Defaults, overridden by the JSON baked in through `SMARTSWITCH_CONFIG`.
    pub fn from_build_env() -> Result<Self> {
        match option_env!("SMARTSWITCH_CONFIG") {
            Some(json) if !json.trim().is_empty() => Self::from_json(json),
            _ => Ok(Self::default()),
        }
    }

    /// Replace the compiled network credentials with stored ones, if any.
    /// Returns `true` when stored credentials were applied.
    pub fn apply_stored_credentials(&mut self, storage: &impl StoragePort) -> bool {
        match StoredCredentials::load(storage) {
            Ok(creds) => {
                self.network.wifi_ssid = creds.ssid.as_str().into();
                self.network.wifi_password = creds.password.as_str().into();
                true
            }
            Err(StorageError::NotFound) => false,
            Err(e) => {
                log::warn!("config: stored credentials unreadable ({}), using compiled ones", e);
                false
            }
        }
    }

    /// Range-check every field that would make the firmware misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.broker.host.is_empty() {
            return Err(Error::Config("broker.host must not be empty"));
        }
        if self.broker.port == 0 {
            return Err(Error::Config("broker.port must be non-zero"));
        }
        if self.broker.publish_topic.is_empty()
            || self.broker.subscribe_topic.is_empty()
            || self.broker.heartbeat_topic.is_empty()
        {
            return Err(Error::Config("broker topics must not be empty"));
        }
        if self.broker.publish_topic.len() > OUTBOUND_TOPIC_CAPACITY {
            return Err(Error::Config("broker.publish_topic must be at most 64 bytes"));
        }
        if self.broker.heartbeat_topic.len() > OUTBOUND_TOPIC_CAPACITY {
            return Err(Error::Config("broker.heartbeat_topic must be at most 64 bytes"));
        }
        if !self.broker.username.is_empty() && self.broker.password.is_empty() {
            return Err(Error::Config("broker.password must be set when broker.username is"));
        }
        if self.broker.client_id_prefix.len() > 20 {
            return Err(Error::Config("broker.client_id_prefix must be at most 20 bytes"));
        }
        let id = &self.identity;
        let id_len = id.work_package.len()
            + id.gateway_type.len()
            + id.firmware_date.len()
            + id.device_serial.len();
        if id_len == 0 || id_len > 32 {
            return Err(Error::Config("device identifier must be 1-32 bytes"));
        }
        if self.broker.subscribe_topic.len() + 1 + id_len > 96 {
            return Err(Error::Config("broker.subscribe_topic too long for inbound topic"));
        }
        if self.retry.wifi_attempt_count == 0 || self.retry.wifi_wait_count == 0 {
            return Err(Error::Config("wifi attempt and wait counts must be >= 1"));
        }
        if self.retry.wifi_cycle_budget == 0 {
            return Err(Error::Config("retry.wifi_cycle_budget must be >= 1"));
        }
        if self.retry.broker_attempt_count == 0 {
            return Err(Error::Config("retry.broker_attempt_count must be >= 1"));
        }
        if self.retry.wifi_attempt_interval_ms == 0
            || self.retry.wifi_wait_interval_ms == 0
            || self.retry.broker_attempt_interval_ms == 0
        {
            return Err(Error::Config("retry intervals must be non-zero"));
        }
        if !(1..=64).contains(&self.debounce.min_bit_length) {
            return Err(Error::Config("debounce.min_bit_length must be 1-64"));
        }
        if self.debounce.global_window_ms == 0 {
            return Err(Error::Config("debounce.global_window_ms must be non-zero"));
        }
        // A full ledger evicts its oldest code; that code must already be
        // outside the per-code window or a repeat would slip through.
        if u64::from(self.debounce.per_code_window_ms)
            >= u64::from(self.debounce.global_window_ms) * LEDGER_CAPACITY as u64
        {
            return Err(Error::Config(
                "debounce.per_code_window_ms must be < global_window_ms x ledger capacity",
            ));
        }
        if self.heartbeat_interval_ms < 1000 {
            return Err(Error::Config("heartbeat_interval_ms must be >= 1000"));
        }
        if !(1..=1000).contains(&self.loop_interval_ms) {
            return Err(Error::Config("loop_interval_ms must be 1-1000"));
        }
        if self.watchdog_timeout_ms <= self.loop_interval_ms {
            return Err(Error::Config("watchdog_timeout_ms must exceed loop_interval_ms"));
        }
        Ok(())
    }
}
