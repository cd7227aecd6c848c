//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the chamber controller:
//! settings orchestration, threshold evaluation, and the thermostat
//! tick. All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod events;
pub mod ports;
pub mod service;
