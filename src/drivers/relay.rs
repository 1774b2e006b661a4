//! Four-channel relay driver.
//!
//! Each channel is an active-HIGH digital output driving a relay coil
//! through a transistor. The driver remembers the last commanded level
//! so the hardware adapter can report it without reading registers back.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::switch_bank::{SWITCH_COUNT, SwitchId};

pub struct RelayBank<P: OutputPin> {
    pins: [P; SWITCH_COUNT],
    levels: [bool; SWITCH_COUNT],
}

impl<P: OutputPin> RelayBank<P> {
    /// Take ownership of the four pins in SW1..SW4 order. All relays start off.
    pub fn new(mut pins: [P; SWITCH_COUNT]) -> Self {
        for pin in &mut pins {
            let _ = pin.set_low();
        }
        Self {
            pins,
            levels: [false; SWITCH_COUNT],
        }
    }

    pub fn set(&mut self, id: SwitchId, on: bool) {
        let pin = &mut self.pins[id.index()];
        let result = if on { pin.set_high() } else { pin.set_low() };
        if result.is_err() {
            warn!("Relay: failed to drive SW{}", id.number());
            return;
        }
        self.levels[id.index()] = on;
    }

    pub fn is_on(&self, id: SwitchId) -> bool {
        self.levels[id.index()]
    }
}
