//! SmartSwitch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod pins;

// The ESP-IDF-only parts of these are cfg-gated inside; host builds get
// simulation backends.
pub mod adapters;
pub mod drivers;
