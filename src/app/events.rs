//! Outbound events and the status snapshot.
//!
//! The [`ChamberService`](super::service::ChamberService) emits
//! [`ChamberEvent`]s through the [`EventSink`](super::ports::EventSink)
//! port, and builds a [`ChamberStatus`] on demand for the embedding
//! application's reporting layer — status endpoint, display, MQTT,
//! whatever sits on the other side.

use heapless::Vec;
use serde::Serialize;

use crate::control::thresholds::ControlThresholds;
use crate::fsm::ControlState;
use crate::sensors::{ProbeReading, SensorAddress, MAX_PROBES};

/// Structured events emitted by the control core.
#[derive(Debug, Clone)]
pub enum ChamberEvent {
    /// The service has started (carries the initial state).
    Started(ControlState),

    /// The thermostat committed a transition.
    StateChanged { from: ControlState, to: ControlState },
}

/// Read-only snapshot for external reporting.
///
/// `chamber_temp_c` and `ambient_temp_c` are the last converted readings
/// for the two configured probes; the disconnected sentinel passes
/// through as-is. `probes` enumerates everything on the bus so a UI can
/// offer an address picker.
#[derive(Debug, Clone, Serialize)]
pub struct ChamberStatus {
    pub state: ControlState,
    pub target_temp: f32,
    pub enable_heater: bool,
    pub enable_cooler: bool,
    pub chamber_sensor_address: SensorAddress,
    pub ambient_sensor_address: SensorAddress,
    pub thresholds: ControlThresholds,
    pub chamber_temp_c: f32,
    pub ambient_temp_c: f32,
    pub probes: Vec<ProbeReading, MAX_PROBES>,
}
