//! Device identifier and broker naming.
//!
//! The identifier is the concatenation of work-package code, gateway type,
//! firmware build date and serial, with no delimiter. It qualifies the
//! inbound topic and leads every outbound payload.

use core::fmt::Write;

use crate::app::ports::SystemPort;
use crate::config::{BrokerConfig, DeviceIdentity};

pub type DeviceId = heapless::String<32>;
pub type Topic = heapless::String<96>;
pub type ClientId = heapless::String<32>;

/// Longest configured status or heartbeat topic.
pub const OUTBOUND_TOPIC_CAPACITY: usize = 64;
pub type OutboundTopicName = heapless::String<OUTBOUND_TOPIC_CAPACITY>;

/// Build the fixed device identifier, e.g. `"1225102502120006"`.
pub fn device_id(identity: &DeviceIdentity) -> DeviceId {
    let mut id = DeviceId::new();
    let _ = write!(
        id,
        "{}{}{}{}",
        identity.work_package, identity.gateway_type, identity.firmware_date, identity.device_serial
    );
    id
}

/// `<subscribe_base>/<device_id>`
pub fn inbound_topic(broker: &BrokerConfig, device_id: &str) -> Topic {
    let mut topic = Topic::new();
    let _ = write!(topic, "{}/{}", broker.subscribe_topic, device_id);
    topic
}

/// Fresh client id for one broker CONNECT attempt: the configured prefix
/// followed by three random 16-bit values in uppercase hex.
pub fn session_client_id(prefix: &str, rng: &mut impl SystemPort) -> ClientId {
    let a = rng.random_u32() & 0xFFFF;
    let b = rng.random_u32() & 0xFFFF;
    let c = rng.random_u32() & 0xFFFF;
    let mut id = ClientId::new();
    let _ = write!(id, "{prefix}{a:04X}{b:04X}{c:04X}");
    id
}

/// Copy `s` into a fixed-capacity string, dropping whatever does not fit.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
