//! Hold-to-confirm reset button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. The main loop samples the
//! level every tick; there is no interrupt.
//!
//! ## Gesture detection
//!
//! | Transition                          | Gesture     |
//! |-------------------------------------|-------------|
//! | released → pressed                  | `Armed`     |
//! | pressed for `hold_ms` continuously  | `Confirmed` |
//! | released before `hold_ms`           | `Cancelled` |
//!
//! `Confirmed` fires once per press; releasing afterwards is silent.

use embedded_hal::digital::InputPin;

use crate::app::ports::ResetGesture;

/// Pure hold-timing state machine, independent of the pin.
#[derive(Debug, Clone)]
pub struct HoldDetector {
    hold_ms: u64,
    pressed_since: Option<u64>,
    confirmed: bool,
}

impl HoldDetector {
    pub fn new(hold_ms: u32) -> Self {
        Self {
            hold_ms: u64::from(hold_ms),
            pressed_since: None,
            confirmed: false,
        }
    }

    /// Feed the current level; returns a gesture on transitions.
    pub fn update(&mut self, now_ms: u64, pressed: bool) -> Option<ResetGesture> {
        match (self.pressed_since, pressed) {
            (None, true) => {
                self.pressed_since = Some(now_ms);
                self.confirmed = false;
                Some(ResetGesture::Armed)
            }
            (Some(since), true) => {
                if !self.confirmed && now_ms.saturating_sub(since) >= self.hold_ms {
                    self.confirmed = true;
                    return Some(ResetGesture::Confirmed);
                }
                None
            }
            (Some(_), false) => {
                self.pressed_since = None;
                if self.confirmed {
                    None
                } else {
                    Some(ResetGesture::Cancelled)
                }
            }
            (None, false) => None,
        }
    }
}

/// Reset button on a GPIO input.
pub struct ResetButton<I: InputPin> {
    pin: I,
    detector: HoldDetector,
}

impl<I: InputPin> ResetButton<I> {
    pub fn new(pin: I, hold_ms: u32) -> Self {
        Self {
            pin,
            detector: HoldDetector::new(hold_ms),
        }
    }

    /// Sample the pin and run the hold detector.
    pub fn poll(&mut self, now_ms: u64) -> Option<ResetGesture> {
        // A pin read error counts as released.
        let pressed = self.pin.is_low().unwrap_or(false);
        self.detector.update(now_ms, pressed)
    }
}
