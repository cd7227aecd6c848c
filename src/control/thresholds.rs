//! Hysteresis threshold derivation.
//!
//! Four setpoints around the target temperature define the bang-bang
//! band. Engage thresholds sit a full hysteresis step away from target;
//! disengage thresholds sit `hysteresis_factor` of that step away, so
//! the factor tunes how far back toward target an actuator drives before
//! letting go:
//!
//! ```text
//!     cooler_on  ──── target + hysteresis_high
//!     cooler_off ──── target + hysteresis_high × factor
//!     target     ────
//!     heater_off ──── target − hysteresis_low  × factor
//!     heater_on  ──── target − hysteresis_low
//! ```

use serde::Serialize;

use crate::config::ChamberConfig;

/// The four derived setpoints (°C).
///
/// Cheap to compute, so callers derive from the live config at every
/// point of use rather than caching a copy that could go stale between
/// config updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlThresholds {
    /// Engage the heater at or below this reading.
    pub heater_on_temp: f32,
    /// Disengage the heater at or above this reading.
    pub heater_off_temp: f32,
    /// Engage the cooler at or above this reading.
    pub cooler_on_temp: f32,
    /// Disengage the cooler at or below this reading.
    pub cooler_off_temp: f32,
}

impl ControlThresholds {
    /// Derive all four setpoints from the current configuration.
    pub fn derive(config: &ChamberConfig) -> Self {
        Self {
            heater_on_temp: config.target_temp - config.hysteresis_low,
            heater_off_temp: config.target_temp
                - config.hysteresis_low * config.hysteresis_factor,
            cooler_on_temp: config.target_temp + config.hysteresis_high,
            cooler_off_temp: config.target_temp
                + config.hysteresis_high * config.hysteresis_factor,
        }
    }
}
