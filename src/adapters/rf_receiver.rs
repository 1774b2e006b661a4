//! 433 MHz receiver adapter.
//!
//! OOK demodulation is not part of this crate. The receiver driver that
//! owns the RF data line decodes frames in its own task and hands each
//! complete one over through [`on_rf_decoded`]. Frames wait in a small
//! critical-section mailbox until the main loop takes them through
//! [`RfReceiverPort`].
//!
//! ```text
//!   receiver task ─▶ on_rf_decoded() ─▶ RF_MAILBOX ─▶ RfReceiver::take_sample()
//! ```
//!
//! The mailbox lock is a `std` mutex on every target, so the hook must be
//! called from task context, never from an ISR.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::app::ports::{RfEvent, RfReceiverPort};

/// Frames buffered between decoder and main loop.
pub const MAILBOX_CAPACITY: usize = 8;

/// Bounded FIFO shared between the decoder context and the main loop.
pub struct RfMailbox {
    queue: Mutex<RefCell<Deque<RfEvent, MAILBOX_CAPACITY>>>,
}

impl RfMailbox {
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Queue a frame. Returns `false` (frame dropped) when full.
    pub fn push(&self, event: RfEvent) -> bool {
        critical_section::with(|cs| self.queue.borrow_ref_mut(cs).push_back(event).is_ok())
    }

    pub fn take(&self) -> Option<RfEvent> {
        critical_section::with(|cs| self.queue.borrow_ref_mut(cs).pop_front())
    }
}

impl Default for RfMailbox {
    fn default() -> Self {
        Self::new()
    }
}

static RF_MAILBOX: RfMailbox = RfMailbox::new();

/// Decoder entry point: one complete frame of `bit_length` bits.
///
/// Task context only. Returns `false` when the mailbox was full and the
/// frame was dropped.
pub fn on_rf_decoded(code: u64, bit_length: u32, now_ms: u64) -> bool {
    RF_MAILBOX.push(RfEvent {
        code,
        bit_length,
        observed_at_ms: now_ms,
    })
}

/// Main-loop side of a mailbox.
pub struct RfReceiver {
    mailbox: &'static RfMailbox,
}

impl RfReceiver {
    /// Reader for the board-wide mailbox fed by [`on_rf_decoded`].
    pub fn new() -> Self {
        Self::with_mailbox(&RF_MAILBOX)
    }

    pub fn with_mailbox(mailbox: &'static RfMailbox) -> Self {
        Self { mailbox }
    }
}

impl Default for RfReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl RfReceiverPort for RfReceiver {
    fn take_sample(&mut self) -> Option<RfEvent> {
        self.mailbox.take()
    }
}
