//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the relay bank, status LED, reset button and RF receiver and
//! exposes them through the board ports. This is the only module that
//! touches actual hardware. On non-espidf targets the underlying drivers
//! use cfg-gated simulation stubs and restarts are recorded instead of
//! performed.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::adapters::rf_receiver::RfReceiver;
use crate::app::events::RestartReason;
use crate::app::ports::{
    IndicatorPort, ResetGesture, ResetInputPort, RfEvent, RfReceiverPort, SwitchOutputPort,
    SystemPort,
};
use crate::app::switch_bank::SwitchId;
use crate::drivers::button::ResetButton;
use crate::drivers::relay::RelayBank;
use crate::drivers::status_led::StatusLed;

/// Concrete adapter that combines all board I/O behind port traits.
pub struct HardwareAdapter<O: OutputPin, I: InputPin> {
    relays: RelayBank<O>,
    led: StatusLed<O>,
    button: ResetButton<I>,
    rf: RfReceiver,
    last_restart: Option<RestartReason>,
    #[cfg(not(target_os = "espidf"))]
    entropy_counter: u64,
}

impl<O: OutputPin, I: InputPin> HardwareAdapter<O, I> {
    pub fn new(relays: RelayBank<O>, led: StatusLed<O>, button: ResetButton<I>, rf: RfReceiver) -> Self {
        Self {
            relays,
            led,
            button,
            rf,
            last_restart: None,
            #[cfg(not(target_os = "espidf"))]
            entropy_counter: 0,
        }
    }

    pub fn relay_on(&self, id: SwitchId) -> bool {
        self.relays.is_on(id)
    }

    pub fn led_lit(&self) -> bool {
        self.led.is_lit()
    }

    /// Reason passed to the most recent `restart` (simulation only ever
    /// gets past the call).
    pub fn last_restart(&self) -> Option<RestartReason> {
        self.last_restart
    }
}

// ── SwitchOutputPort ──────────────────────────────────────────

impl<O: OutputPin, I: InputPin> SwitchOutputPort for HardwareAdapter<O, I> {
    fn set_output(&mut self, id: SwitchId, on: bool) {
        self.relays.set(id, on);
    }
}

// ── IndicatorPort ─────────────────────────────────────────────

impl<O: OutputPin, I: InputPin> IndicatorPort for HardwareAdapter<O, I> {
    fn set_link_up(&mut self, up: bool) {
        self.led.set_steady(up);
    }

    fn flash(&mut self, now_ms: u64, count: u8) {
        self.led.flash(now_ms, count);
    }

    fn refresh(&mut self, now_ms: u64) {
        self.led.refresh(now_ms);
    }
}

// ── ResetInputPort ────────────────────────────────────────────

impl<O: OutputPin, I: InputPin> ResetInputPort for HardwareAdapter<O, I> {
    fn poll_reset(&mut self, now_ms: u64) -> Option<ResetGesture> {
        self.button.poll(now_ms)
    }
}

// ── RfReceiverPort ────────────────────────────────────────────

impl<O: OutputPin, I: InputPin> RfReceiverPort for HardwareAdapter<O, I> {
    fn take_sample(&mut self) -> Option<RfEvent> {
        self.rf.take_sample()
    }
}

// ── SystemPort ────────────────────────────────────────────────

impl<O: OutputPin, I: InputPin> SystemPort for HardwareAdapter<O, I> {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self, reason: RestartReason) {
        self.last_restart = Some(reason);
        log::warn!("System: restarting ({:?})", reason);
        // SAFETY: esp_restart never returns; nothing is borrowed across it.
        unsafe { esp_idf_svc::sys::esp_restart() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self, reason: RestartReason) {
        self.last_restart = Some(reason);
        log::warn!("System(sim): restart requested ({:?})", reason);
    }

    #[cfg(target_os = "espidf")]
    fn random_u32(&mut self) -> u32 {
        // SAFETY: reads the hardware RNG register.
        unsafe { esp_idf_svc::sys::esp_random() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn random_u32(&mut self) -> u32 {
        use std::hash::{BuildHasher, Hasher};

        self.entropy_counter = self.entropy_counter.wrapping_add(1);
        let mut hasher = std::collections::hash_map::RandomState::new().build_hasher();
        hasher.write_u64(self.entropy_counter);
        hasher.finish() as u32
    }
}
