//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production). Each line is
//! tagged with its subsystem: `SWITCH`, `RF`, `NET`, `MQTT` or `RESET`.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            // ── Switches ──────────────────────────────────────
            AppEvent::Restored(states) => {
                info!(
                    "SWITCH | restored sw1={} sw2={} sw3={} sw4={}",
                    u8::from(states[0]),
                    u8::from(states[1]),
                    u8::from(states[2]),
                    u8::from(states[3]),
                );
            }
            AppEvent::SwitchChanged { id, on } => {
                info!("SWITCH | sw{} -> {}", id.number(), u8::from(*on));
            }
            AppEvent::AllSwitchesChanged(on) => {
                info!("SWITCH | all -> {}", u8::from(*on));
            }
            AppEvent::PersistFailed(e) => {
                warn!("SWITCH | persist failed: {}", e);
            }

            // ── RF ────────────────────────────────────────────
            AppEvent::RfSample {
                code,
                bit_length,
                outcome,
            } => {
                if outcome.is_accepted() {
                    info!("RF | code={} bits={} accepted", code, bit_length);
                } else {
                    debug!("RF | code={} bits={} {:?}", code, bit_length, outcome);
                }
            }

            // ── Network link ──────────────────────────────────
            AppEvent::NetworkConnecting { cycles_left } => {
                info!("NET | connecting ({} cycles left)", cycles_left);
            }
            AppEvent::NetworkBeginFailed(e) => {
                warn!("NET | begin failed: {}", e);
            }
            AppEvent::NetworkWaiting => {
                info!("NET | attempt window over, waiting");
            }
            AppEvent::NetworkCycleFailed { cycles_left } => {
                warn!("NET | cycle failed ({} cycles left)", cycles_left);
            }
            AppEvent::NetworkUp => info!("NET | up"),
            AppEvent::NetworkLost => warn!("NET | link lost"),

            // ── Broker session ────────────────────────────────
            AppEvent::SessionConnecting {
                client_id,
                attempts_left,
            } => {
                info!("MQTT | connecting as {} ({} attempts left)", client_id, attempts_left);
            }
            AppEvent::SessionAttemptFailed { attempts_left } => {
                warn!("MQTT | connect failed ({} attempts left)", attempts_left);
            }
            AppEvent::SessionUp { client_id } => {
                info!("MQTT | session up as {}", client_id);
            }
            AppEvent::SessionLost => warn!("MQTT | session lost"),
            AppEvent::SubscribeFailed(e) => warn!("MQTT | subscribe failed: {}", e),
            AppEvent::CommandIgnored(text) => debug!("MQTT | ignored '{}'", text),
            AppEvent::PublishFailed(e) => warn!("MQTT | publish failed: {}", e),

            // ── Reset / restart ───────────────────────────────
            AppEvent::ResetArmed => info!("RESET | armed, keep holding"),
            AppEvent::ResetCancelled => info!("RESET | released early, cancelled"),
            AppEvent::CredentialEraseFailed => warn!("RESET | credential erase incomplete"),
            AppEvent::Restarting(reason) => warn!("RESET | restarting: {:?}", reason),
        }
    }
}
