//! MQTT broker adapter.
//!
//! Implements [`BrokerPort`]. Each `connect()` builds a fresh client with
//! the client id chosen by the connectivity machine; the previous client
//! (if any) is dropped first.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   The client's event callback runs on the MQTT task; it flips the
//!   `connected` flag and queues received messages for the main loop.
//! - **all other targets**: an in-memory loopback broker for host tests.

use log::{info, warn};

use crate::app::ports::{BrokerPort, InboundMessage};
use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::identity;

#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "espidf")]
use std::sync::{Arc, Mutex};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// Inbound messages buffered between the MQTT task and the main loop.
pub const INBOUND_CAPACITY: usize = 8;

type InboundQueue = heapless::Deque<InboundMessage, INBOUND_CAPACITY>;

/// Copy a received publish into a bounded message. Oversized fields are
/// truncated at a character boundary.
fn inbound_message(topic: &str, data: &[u8]) -> InboundMessage {
    let payload = core::str::from_utf8(data).unwrap_or_default();
    InboundMessage {
        topic: identity::bounded(topic),
        payload: identity::bounded(payload),
    }
}

fn enqueue(queue: &mut InboundQueue, message: InboundMessage) {
    if queue.push_back(message).is_err() {
        warn!("MQTT: inbound queue full, message dropped");
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF client state
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
#[derive(Default)]
struct Shared {
    connected: AtomicBool,
    inbound: Mutex<InboundQueue>,
}

// ───────────────────────────────────────────────────────────────
// MQTT adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    config: BrokerConfig,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    shared: Arc<Shared>,
    /// Simulation: whether the broker accepts CONNECT.
    #[cfg(not(target_os = "espidf"))]
    sim_accepting: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_client_ids: Vec<String>,
    #[cfg(not(target_os = "espidf"))]
    sim_subscriptions: Vec<String>,
    #[cfg(not(target_os = "espidf"))]
    sim_published: Vec<(String, String)>,
    #[cfg(not(target_os = "espidf"))]
    sim_inbound: InboundQueue,
}

impl MqttAdapter {
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            config: config.clone(),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            shared: Arc::new(Shared::default()),
            #[cfg(not(target_os = "espidf"))]
            sim_accepting: true,
            #[cfg(not(target_os = "espidf"))]
            sim_connected: false,
            #[cfg(not(target_os = "espidf"))]
            sim_client_ids: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_subscriptions: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_published: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_inbound: InboundQueue::new(),
        }
    }

    fn broker_url(&self) -> String {
        format!("mqtt://{}:{}", self.config.host, self.config.port)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, client_id: &str) -> Result<(), BrokerError> {
        self.platform_disconnect();

        // Fresh state per client so a late callback from the old one is ignored.
        let shared = Arc::new(Shared::default());
        let cb_shared = Arc::clone(&shared);

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            username: (!self.config.username.is_empty()).then_some(self.config.username.as_str()),
            password: (!self.config.password.is_empty()).then_some(self.config.password.as_str()),
            ..Default::default()
        };

        let client = EspMqttClient::new_cb(&self.broker_url(), &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => cb_shared.connected.store(true, Ordering::Release),
                EventPayload::Disconnected => cb_shared.connected.store(false, Ordering::Release),
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } => {
                    if let Ok(mut queue) = cb_shared.inbound.lock() {
                        enqueue(&mut queue, inbound_message(topic, data));
                    }
                }
                EventPayload::Error(e) => log::warn!("MQTT: client error {:?}", e),
                _ => {}
            }
        })
        .map_err(|e| {
            warn!("MQTT: client creation failed ({:?})", e);
            BrokerError::ConnectFailed
        })?;

        self.client = Some(client);
        self.shared = shared;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, client_id: &str) -> Result<(), BrokerError> {
        self.sim_client_ids.push(client_id.to_owned());
        self.sim_subscriptions.clear();
        self.sim_connected = self.sim_accepting;
        if self.sim_connected {
            Ok(())
        } else {
            Err(BrokerError::ConnectFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.client.is_some() && self.shared.connected.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::NotConnected)?;
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| BrokerError::SubscribeFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        self.sim_subscriptions.push(topic.to_owned());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|_| BrokerError::PublishFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError> {
        self.sim_published.push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll(&mut self) -> Option<InboundMessage> {
        self.shared.inbound.lock().ok()?.pop_front()
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll(&mut self) -> Option<InboundMessage> {
        self.sim_inbound.pop_front()
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        // Dropping the client stops and destroys it.
        self.client = None;
        self.shared.connected.store(false, Ordering::Release);
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_connected = false;
        self.sim_subscriptions.clear();
    }
}

// ── Simulation controls ───────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    /// Whether future CONNECTs succeed.
    pub fn sim_set_accepting(&mut self, accepting: bool) {
        self.sim_accepting = accepting;
    }

    /// Drop the session from the broker side.
    pub fn sim_drop_session(&mut self) {
        self.sim_connected = false;
    }

    /// Deliver a message from another client. Only reaches the device
    /// when it is connected and subscribed to `topic`.
    pub fn sim_inject(&mut self, topic: &str, payload: &str) -> bool {
        if !self.sim_connected || !self.sim_subscriptions.iter().any(|t| t == topic) {
            return false;
        }
        enqueue(&mut self.sim_inbound, inbound_message(topic, payload.as_bytes()));
        true
    }

    pub fn sim_client_ids(&self) -> &[String] {
        &self.sim_client_ids
    }

    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim_subscriptions
    }

    pub fn sim_published(&self) -> &[(String, String)] {
        &self.sim_published
    }
}

// ───────────────────────────────────────────────────────────────
// BrokerPort
// ───────────────────────────────────────────────────────────────

impl BrokerPort for MqttAdapter {
    fn connect(&mut self, client_id: &str) -> Result<(), BrokerError> {
        info!("MQTT: connecting to {} as '{}'", self.broker_url(), client_id);
        self.platform_connect(client_id)
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        if !self.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.platform_subscribe(topic)?;
        info!("MQTT: subscribed to '{}'", topic);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError> {
        if !self.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.platform_publish(topic, payload)
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.platform_poll()
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        info!("MQTT: disconnected");
    }
}
