//! Control-law helpers for the thermostat.

pub mod thresholds;
