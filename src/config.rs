//! Chamber configuration parameters.
//!
//! All tunable parameters for the thermostat. Values arrive from the
//! embedding application's persistence or config endpoint through the
//! settings store; the core consumes them as-is, so range validation
//! belongs to whichever layer accepts them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sensors::SensorAddress;

/// Chamber controller configuration.
///
/// Fields missing from a serialized document deserialize to their
/// defaults, so configs persisted by older firmware keep loading after a
/// field is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChamberConfig {
    // --- Probes ---
    /// Address of the probe inside the chamber (drives control).
    pub chamber_sensor_address: SensorAddress,
    /// Address of the ambient probe (reporting only).
    pub ambient_sensor_address: SensorAddress,

    // --- Setpoint ---
    /// Target chamber temperature (°C).
    pub target_temp: f32,
    /// Degrees below target before the heater engages.
    pub hysteresis_low: f32,
    /// Degrees above target before the cooler engages.
    pub hysteresis_high: f32,
    /// Scales the hysteresis step for the disengage thresholds:
    /// 0.0 disengages at target, 1.0 disengages where it engaged.
    pub hysteresis_factor: f32,

    // --- Actuator protection ---
    /// Minimum time the heater stays on once engaged (seconds).
    pub min_heater_on_secs: u32,
    /// Minimum time the heater stays off once disengaged (seconds).
    pub min_heater_off_secs: u32,
    /// Minimum time the cooler stays on once engaged (seconds).
    pub min_cooler_on_secs: u32,
    /// Minimum time the cooler stays off once disengaged (seconds).
    /// Compressors need this one; keep it generous.
    pub min_cooler_off_secs: u32,

    // --- Enable flags ---
    /// Allow the heater output to engage.
    pub enable_heater: bool,
    /// Allow the cooler output to engage.
    pub enable_cooler: bool,
}

impl Default for ChamberConfig {
    fn default() -> Self {
        Self {
            // Probes (unassigned until the embedding app picks them)
            chamber_sensor_address: SensorAddress::UNCONFIGURED,
            ambient_sensor_address: SensorAddress::UNCONFIGURED,

            // Setpoint: ale fermentation
            target_temp: 20.0,
            hysteresis_low: 0.5,
            hysteresis_high: 0.5,
            hysteresis_factor: 0.0,

            // Actuator protection
            min_heater_on_secs: 60,
            min_heater_off_secs: 60,
            min_cooler_on_secs: 120,
            min_cooler_off_secs: 300, // compressor anti-short-cycle

            // Outputs stay disabled until probes are assigned
            enable_heater: false,
            enable_cooler: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical JSON boundary
// ---------------------------------------------------------------------------

/// Patch `config` from a JSON document, field by field.
///
/// Total on any input: a field that is absent or carries the wrong type
/// leaves the current value in place, so a partial document updates only
/// what it names. Probe addresses travel as 16-hex-digit strings.
/// Shaped to plug into [`SettingsService::update_from`](crate::settings::SettingsService::update_from).
pub fn apply_json(root: &Value, config: &mut ChamberConfig) {
    if let Some(v) = addr_field(root, "chamber_sensor_address") {
        config.chamber_sensor_address = v;
    }
    if let Some(v) = addr_field(root, "ambient_sensor_address") {
        config.ambient_sensor_address = v;
    }
    if let Some(v) = f32_field(root, "target_temp") {
        config.target_temp = v;
    }
    if let Some(v) = f32_field(root, "hysteresis_low") {
        config.hysteresis_low = v;
    }
    if let Some(v) = f32_field(root, "hysteresis_high") {
        config.hysteresis_high = v;
    }
    if let Some(v) = f32_field(root, "hysteresis_factor") {
        config.hysteresis_factor = v;
    }
    if let Some(v) = u32_field(root, "min_heater_on_secs") {
        config.min_heater_on_secs = v;
    }
    if let Some(v) = u32_field(root, "min_heater_off_secs") {
        config.min_heater_off_secs = v;
    }
    if let Some(v) = u32_field(root, "min_cooler_on_secs") {
        config.min_cooler_on_secs = v;
    }
    if let Some(v) = u32_field(root, "min_cooler_off_secs") {
        config.min_cooler_off_secs = v;
    }
    if let Some(v) = root.get("enable_heater").and_then(Value::as_bool) {
        config.enable_heater = v;
    }
    if let Some(v) = root.get("enable_cooler").and_then(Value::as_bool) {
        config.enable_cooler = v;
    }
}

/// Serialize `config` into `out` in the same wire form `apply_json`
/// accepts. Shaped to plug into
/// [`SettingsService::read_into`](crate::settings::SettingsService::read_into).
pub fn write_json(config: &ChamberConfig, out: &mut Value) {
    // Plain struct with string map keys; serialization cannot fail.
    *out = serde_json::to_value(config).unwrap_or(Value::Null);
}

fn addr_field(root: &Value, key: &str) -> Option<SensorAddress> {
    root.get(key).and_then(Value::as_str).and_then(SensorAddress::parse)
}

fn f32_field(root: &Value, key: &str) -> Option<f32> {
    root.get(key).and_then(Value::as_f64).map(|v| v as f32)
}

fn u32_field(root: &Value, key: &str) -> Option<u32> {
    root.get(key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}
