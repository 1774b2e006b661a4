//! Single-colour status LED driver.
//!
//! Steady level shows the broker session (on = connected). A flash
//! briefly inverts the steady level `count` times, 50 ms per half-period,
//! without blocking the main loop.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LED GPIO via [`GpioOutput`](super::hw_init::GpioOutput).
//! On host/test: any `embedded-hal` output pin.

use embedded_hal::digital::OutputPin;

/// Half-period of one flash blink.
const FLASH_HALF_PERIOD_MS: u64 = 50;

#[derive(Debug, Clone, Copy)]
struct Flash {
    started_ms: u64,
    count: u8,
}

pub struct StatusLed<P: OutputPin> {
    pin: P,
    steady_on: bool,
    flash: Option<Flash>,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        let mut led = Self {
            pin,
            steady_on: false,
            flash: None,
            lit: true,
        };
        led.drive(false);
        led
    }

    pub fn set_steady(&mut self, on: bool) {
        self.steady_on = on;
        if self.flash.is_none() {
            self.drive(on);
        }
    }

    /// Start a flash pattern; replaces any pattern still running.
    pub fn flash(&mut self, now_ms: u64, count: u8) {
        if count == 0 {
            return;
        }
        self.flash = Some(Flash {
            started_ms: now_ms,
            count,
        });
        self.drive(!self.steady_on);
    }

    /// Advance the flash pattern. Call every loop iteration.
    pub fn refresh(&mut self, now_ms: u64) {
        let Some(flash) = self.flash else {
            self.drive(self.steady_on);
            return;
        };
        let elapsed = now_ms.saturating_sub(flash.started_ms);
        let half_periods = elapsed / FLASH_HALF_PERIOD_MS;
        if half_periods >= u64::from(flash.count) * 2 {
            self.flash = None;
            self.drive(self.steady_on);
        } else if half_periods % 2 == 0 {
            self.drive(!self.steady_on);
        } else {
            self.drive(self.steady_on);
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_some()
    }

    fn drive(&mut self, on: bool) {
        if on == self.lit {
            return;
        }
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if result.is_ok() {
            self.lit = on;
        }
    }
}
