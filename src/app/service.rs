//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the switch bank, the RF debouncer, the connectivity
//! machine and the dispatcher. All I/O flows through port traits injected
//! at call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  RfReceiverPort ──▶ ┌──────────────────────────────┐ ──▶ SwitchOutputPort
//!  ResetInputPort ──▶ │          AppService          │ ──▶ IndicatorPort
//!     NetworkPort ◀─▶ │ Connectivity · Debounce ·    │ ◀─▶ StoragePort
//!      BrokerPort ◀─▶ │ Dispatcher · SwitchBank      │ ──▶ EventSink
//!                     └──────────────────────────────┘
//! ```
//!
//! Each tick runs, in order: reset trigger, connectivity, at most one
//! inbound message, the heartbeat, at most one RF sample, indicator.

use log::info;

use super::connectivity::{ConnectivityMachine, ConnectivityState, TickOutcome};
use super::debounce::RfDebouncer;
use super::dispatcher::{CommandDispatcher, DispatchInput, OutboundMessage, OutboundTopic};
use super::events::{AppEvent, RestartReason};
use super::ports::{
    BrokerPort, EventSink, IndicatorPort, NetworkPort, ResetGesture, ResetInputPort,
    RfReceiverPort, StoragePort, SwitchOutputPort, SystemPort,
};
use super::switch_bank::SwitchBank;
use crate::config::{CREDENTIAL_NAMESPACE, SystemConfig};
use crate::identity;

/// Everything the service needs from the board itself.
pub trait BoardPorts:
    SwitchOutputPort + IndicatorPort + ResetInputPort + SystemPort + RfReceiverPort
{
}

impl<T> BoardPorts for T where
    T: SwitchOutputPort + IndicatorPort + ResetInputPort + SystemPort + RfReceiverPort
{
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    bank: SwitchBank,
    debouncer: RfDebouncer,
    link: ConnectivityMachine,
    dispatcher: CommandDispatcher,
    publish_topic: identity::OutboundTopicName,
    heartbeat_topic: identity::OutboundTopicName,
    heartbeat_interval_ms: u64,
    next_heartbeat_ms: Option<u64>,
    halted: bool,
}

impl AppService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig) -> Self {
        let device_id = identity::device_id(&config.identity);
        let inbound = identity::inbound_topic(&config.broker, &device_id);
        info!("AppService: device {} listening on {}", device_id, inbound);

        Self {
            bank: SwitchBank::new(),
            debouncer: RfDebouncer::new(&config.debounce),
            link: ConnectivityMachine::new(config.retry, &config.broker.client_id_prefix, inbound),
            dispatcher: CommandDispatcher::new(device_id, config.heartbeat_interval_ms),
            publish_topic: identity::bounded(&config.broker.publish_topic),
            heartbeat_topic: identity::bounded(&config.broker.heartbeat_topic),
            heartbeat_interval_ms: u64::from(config.heartbeat_interval_ms),
            next_heartbeat_ms: None,
            halted: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore persisted switch states and drive the outputs.
    pub fn start(
        &mut self,
        hw: &mut (impl SwitchOutputPort + IndicatorPort),
        storage: &impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        hw.set_link_up(false);
        if let Err(e) = self.bank.restore_all(hw, storage) {
            sink.emit(&AppEvent::PersistFailed(e));
        }
        sink.emit(&AppEvent::Restored(self.bank.states()));
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one scheduling tick.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut impl BoardPorts,
        net: &mut impl NetworkPort,
        broker: &mut impl BrokerPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        if self.halted {
            return TickOutcome::Halted;
        }

        // 1. Manual reset trigger, sampled even while recovering.
        match hw.poll_reset(now_ms) {
            Some(ResetGesture::Armed) => sink.emit(&AppEvent::ResetArmed),
            Some(ResetGesture::Cancelled) => sink.emit(&AppEvent::ResetCancelled),
            Some(ResetGesture::Confirmed) => {
                self.manual_reset(hw, net, storage, sink);
                return TickOutcome::Restart(RestartReason::ManualReset);
            }
            None => {}
        }

        // 2. Connectivity.
        let outcome = self.link.tick(now_ms, net, broker, hw, sink);
        match outcome {
            TickOutcome::Restart(reason) => {
                hw.set_link_up(false);
                self.halted = true;
                hw.restart(reason);
                return outcome;
            }
            TickOutcome::Halted => {
                self.halted = true;
                return outcome;
            }
            TickOutcome::SessionEstablished => {
                hw.set_link_up(true);
                self.next_heartbeat_ms = Some(now_ms + self.heartbeat_interval_ms);
            }
            TickOutcome::Recovering => {
                hw.set_link_up(false);
                self.next_heartbeat_ms = None;
            }
            TickOutcome::Online => {}
        }

        // 3. At most one inbound command.
        if self.link.is_online() {
            if let Some(msg) = broker.poll_inbound() {
                hw.flash(now_ms, 1);
                if let Some(out) = self.dispatcher.dispatch_text(
                    &msg.payload,
                    &mut self.bank,
                    hw,
                    storage,
                    net,
                    sink,
                ) {
                    self.publish(&out, broker, sink);
                }
            }
        }

        // 4. Heartbeat.
        if let Some(due) = self.next_heartbeat_ms {
            if now_ms >= due {
                let hb = self.dispatcher.heartbeat(net);
                self.publish(&hb, broker, sink);
                self.next_heartbeat_ms = Some(due + self.heartbeat_interval_ms);
            }
        }

        // 5. At most one RF sample.
        if let Some(sample) = hw.take_sample() {
            let verdict = self.debouncer.ingest(&sample);
            sink.emit(&AppEvent::RfSample {
                code: sample.code,
                bit_length: sample.bit_length,
                outcome: verdict,
            });
            if verdict.is_accepted() {
                hw.flash(now_ms, 2);
                if let Some(out) = self.dispatcher.dispatch(
                    DispatchInput::Rf(sample),
                    &mut self.bank,
                    hw,
                    storage,
                    net,
                    sink,
                ) {
                    self.publish(&out, broker, sink);
                }
            } else {
                hw.flash(now_ms, 1);
            }
        }

        // 6. Indicator.
        hw.refresh(now_ms);
        outcome
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn switches(&self) -> &SwitchBank {
        &self.bank
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.link.state()
    }

    pub fn is_online(&self) -> bool {
        self.link.is_online()
    }

    pub fn device_id(&self) -> &str {
        self.dispatcher.device_id()
    }

    /// `true` once a restart has been issued.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    // ── Internal ──────────────────────────────────────────────

    fn manual_reset(
        &mut self,
        hw: &mut impl BoardPorts,
        net: &mut impl NetworkPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let stored = storage.erase_namespace(CREDENTIAL_NAMESPACE);
        let driver = net.erase_credentials();
        if stored.is_err() || driver.is_err() {
            sink.emit(&AppEvent::CredentialEraseFailed);
        }
        self.link.halt();
        self.halted = true;
        hw.set_link_up(false);
        sink.emit(&AppEvent::Restarting(RestartReason::ManualReset));
        hw.restart(RestartReason::ManualReset);
    }

    fn publish(&self, msg: &OutboundMessage, broker: &mut impl BrokerPort, sink: &mut impl EventSink) {
        let topic = match msg.topic {
            OutboundTopic::Status => &self.publish_topic,
            OutboundTopic::Heartbeat => &self.heartbeat_topic,
        };
        if let Err(e) = broker.publish(topic, &msg.payload) {
            sink.emit(&AppEvent::PublishFailed(e));
        }
    }
}
