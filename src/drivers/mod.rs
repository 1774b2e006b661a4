//! Relay, LED and button drivers plus one-shot hardware initialisation.

pub mod button;
pub mod hw_init;
pub mod relay;
pub mod status_led;
pub mod watchdog;
