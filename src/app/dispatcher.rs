//! Command dispatcher.
//!
//! Turns broker commands and accepted RF samples into switch actions and
//! outbound status lines. Every line starts with the device identifier.
//!
//! | Input               | Action             | Outbound                            |
//! |---------------------|--------------------|-------------------------------------|
//! | `sw<n>:<v>`         | set one switch     | `<id>,sw<n>:<v>`                    |
//! | `sw1234:<v>`        | set all switches   | `<id>,sw1234:<v>`                   |
//! | `ping`              | none               | `<id>,<ssid>,<ip>,<rssi>,<hb_ms>`   |
//! | accepted RF sample  | none               | `<id>,<code>`                       |

use core::fmt::Write;
use core::net::Ipv4Addr;

use super::commands::Command;
use super::events::AppEvent;
use super::ports::{EventSink, NetworkInfo, NetworkPort, RfEvent, StoragePort, SwitchOutputPort};
use super::switch_bank::SwitchBank;
use crate::identity::{self, DeviceId};

pub type Payload = heapless::String<128>;

/// Which configured topic an outbound line goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundTopic {
    Status,
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: OutboundTopic,
    pub payload: Payload,
}

/// Something for the dispatcher to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchInput {
    Command(Command),
    /// An RF sample the debouncer accepted.
    Rf(RfEvent),
}

pub struct CommandDispatcher {
    device_id: DeviceId,
    heartbeat_interval_ms: u32,
}

impl CommandDispatcher {
    pub fn new(device_id: DeviceId, heartbeat_interval_ms: u32) -> Self {
        Self {
            device_id,
            heartbeat_interval_ms,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Apply `input` and build the status line to publish.
    ///
    /// Storage failures are reported through `sink`; the switch output
    /// has already changed and the acknowledgement is still produced.
    pub fn dispatch(
        &self,
        input: DispatchInput,
        bank: &mut SwitchBank,
        hw: &mut impl SwitchOutputPort,
        storage: &mut impl StoragePort,
        net: &impl NetworkPort,
        sink: &mut impl EventSink,
    ) -> Option<OutboundMessage> {
        let mut payload = Payload::new();
        match input {
            DispatchInput::Command(Command::SetSwitch(id, on)) => {
                if let Err(e) = bank.set_switch(id, on, hw, storage) {
                    sink.emit(&AppEvent::PersistFailed(e));
                }
                sink.emit(&AppEvent::SwitchChanged { id, on });
                let _ = write!(payload, "{},sw{}:{}", self.device_id, id.number(), u8::from(on));
            }
            DispatchInput::Command(Command::SetAll(on)) => {
                if let Err(e) = bank.set_all(on, hw, storage) {
                    sink.emit(&AppEvent::PersistFailed(e));
                }
                sink.emit(&AppEvent::AllSwitchesChanged(on));
                let _ = write!(payload, "{},sw1234:{}", self.device_id, u8::from(on));
            }
            DispatchInput::Command(Command::Ping) => {
                payload = self.status_line(&net.info());
            }
            DispatchInput::Rf(event) => {
                let _ = write!(payload, "{},{}", self.device_id, event.code);
            }
        }
        Some(OutboundMessage {
            topic: OutboundTopic::Status,
            payload,
        })
    }

    /// Parse inbound text and dispatch it. Unknown text changes nothing
    /// and produces no message.
    pub fn dispatch_text(
        &self,
        text: &str,
        bank: &mut SwitchBank,
        hw: &mut impl SwitchOutputPort,
        storage: &mut impl StoragePort,
        net: &impl NetworkPort,
        sink: &mut impl EventSink,
    ) -> Option<OutboundMessage> {
        let Some(command) = Command::parse(text) else {
            sink.emit(&AppEvent::CommandIgnored(identity::bounded(text)));
            return None;
        };
        self.dispatch(DispatchInput::Command(command), bank, hw, storage, net, sink)
    }

    /// Heartbeat line: same fields as the `ping` reply.
    pub fn heartbeat(&self, net: &impl NetworkPort) -> OutboundMessage {
        OutboundMessage {
            topic: OutboundTopic::Heartbeat,
            payload: self.status_line(&net.info()),
        }
    }

    /// `<id>,<ssid>,<ipv4>,<rssi>,<heartbeat_ms>`
    fn status_line(&self, info: &NetworkInfo) -> Payload {
        let mut payload = Payload::new();
        let _ = write!(
            payload,
            "{},{},{},{},{}",
            self.device_id,
            info.ssid,
            info.address.unwrap_or(Ipv4Addr::UNSPECIFIED),
            info.rssi.unwrap_or(0),
            self.heartbeat_interval_ms
        );
        payload
    }
}
