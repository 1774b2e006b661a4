//! GPIO pin assignments for the SmartSwitch four-channel board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Relay outputs (active HIGH through the relay driver transistors)
// ---------------------------------------------------------------------------

pub const SW1_GPIO: i32 = 14;
pub const SW2_GPIO: i32 = 13;
pub const SW3_GPIO: i32 = 12;
pub const SW4_GPIO: i32 = 4;

/// Relay pins in switch ordinal order (SW1..SW4).
pub const SWITCH_GPIOS: [i32; 4] = [SW1_GPIO, SW2_GPIO, SW3_GPIO, SW4_GPIO];

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Single blue LED. HIGH = on.
pub const STATUS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// 433 MHz receiver
// ---------------------------------------------------------------------------

/// Data line of the superheterodyne receiver module.
pub const RF_RX_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Network reset button (active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// Hold for `reset_hold_ms` to wipe stored network credentials.
pub const RESET_BUTTON_GPIO: i32 = 0;
