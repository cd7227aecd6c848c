//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ChamberService (domain)
//! ```
//!
//! Driven adapters (the one-wire bus driver, relay outputs, event sinks)
//! implement these traits. The
//! [`ChamberService`](super::service::ChamberService) consumes them via
//! generics, so the domain core never touches hardware directly and every
//! test runs against recording mocks.
//!
//! All port contracts are total: a missing probe is a sentinel reading,
//! a failed relay write is the adapter's problem to log. The control
//! loop never branches on an error type.

use heapless::Vec;

use crate::sensors::{SensorAddress, MAX_PROBES};

// ───────────────────────────────────────────────────────────────
// Sensor bus port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port over the one-wire temperature bus.
///
/// The driver behind this trait converts asynchronously:
/// [`request_conversion`](Self::request_conversion) fires a conversion on
/// every probe and returns at once, and
/// [`read_celsius`](Self::read_celsius) hands back the most recent
/// completed conversion without touching the bus timing again.
pub trait SensorBusPort {
    /// Broadcast a start-conversion command to every probe on the bus.
    fn request_conversion(&mut self);

    /// Last converted temperature for `address` (°C).
    ///
    /// Returns [`DISCONNECTED_C`](crate::sensors::DISCONNECTED_C) when
    /// the probe is absent or the read failed — a first-class reading
    /// the control logic interprets, never an error.
    fn read_celsius(&mut self, address: &SensorAddress) -> f32;

    /// Addresses of every probe currently enumerated on the bus.
    fn enumerate(&mut self) -> Vec<SensorAddress, MAX_PROBES>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port commanding the heater/cooler relay pair.
pub trait ActuatorPort {
    /// Drive both outputs in one call.
    ///
    /// Implementations must never leave the pair observably both-on,
    /// even transiently between the two underlying writes. The control
    /// core itself never requests both.
    fn set_outputs(&mut self, heater_on: bool, cooler_on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured
/// [`ChamberEvent`](super::events::ChamberEvent)s through this port.
/// Adapters decide where they go (serial log, MQTT, a websocket status
/// push, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ChamberEvent);
}
