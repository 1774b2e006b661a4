//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the SmartSwitch: switch
//! persistence, RF debouncing, connectivity recovery and command dispatch.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod connectivity;
pub mod debounce;
pub mod dispatcher;
pub mod events;
pub mod ports;
pub mod service;
pub mod switch_bank;
