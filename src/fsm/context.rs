//! Shared mutable context threaded through every state handler.
//!
//! `ControlContext` is the single struct the handlers read from and
//! write to: the per-evaluation snapshot (reading, thresholds, enable
//! flags, clock), the per-actuator dwell clocks that persist across
//! evaluations, and the output commands the orchestrator applies after a
//! committed transition. Think of it as the "blackboard" in a
//! blackboard architecture.

use crate::config::ChamberConfig;
use crate::control::thresholds::ControlThresholds;
use crate::sensors;

// ---------------------------------------------------------------------------
// Output commands (written by state enter handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Requested relay pair positions.
///
/// The constructors cover exactly the three legal combinations, so a
/// both-on pair is unrepresentable by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputCommands {
    heater_on: bool,
    cooler_on: bool,
}

impl OutputCommands {
    /// Both outputs off — the safe pair.
    pub fn idle() -> Self {
        Self {
            heater_on: false,
            cooler_on: false,
        }
    }

    /// Heater on, cooler off.
    pub fn heating() -> Self {
        Self {
            heater_on: true,
            cooler_on: false,
        }
    }

    /// Cooler on, heater off.
    pub fn cooling() -> Self {
        Self {
            heater_on: false,
            cooler_on: true,
        }
    }

    pub fn heater_on(&self) -> bool {
        self.heater_on
    }

    pub fn cooler_on(&self) -> bool {
        self.cooler_on
    }
}

// ---------------------------------------------------------------------------
// Dwell bookkeeping
// ---------------------------------------------------------------------------

/// Which actuator a dwell guard protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuator {
    Heater,
    Cooler,
}

/// Which dwell minimum gates a toggle attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellKind {
    /// The actuator is on and wants to turn off.
    MinOn,
    /// The actuator is off and wants to turn on.
    MinOff,
}

/// Per-actuator toggle clock plus the dwell minima in force.
///
/// `last_toggle_ms` moves only when a guard commits, so it always records
/// the actuator's most recent committed edge. The minima are refreshed
/// from config at the start of every evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActuatorClock {
    /// Timestamp of the last committed toggle (ms). Starting at zero
    /// holds the actuator off for its full minimum-off time after boot,
    /// which is the wanted anti-short-cycle behavior on power restore.
    pub last_toggle_ms: u64,
    /// Minimum time on before the next off toggle (ms).
    pub min_on_ms: u64,
    /// Minimum time off before the next on toggle (ms).
    pub min_off_ms: u64,
}

// ---------------------------------------------------------------------------
// ControlContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct ControlContext {
    // -- Per-evaluation snapshot --
    /// Caller-supplied monotonic clock (ms).
    pub now_ms: u64,
    /// Last converted chamber reading (°C); may be the disconnected
    /// sentinel.
    pub reading_c: f32,
    /// Heater output may engage.
    pub heater_enabled: bool,
    /// Cooler output may engage.
    pub cooler_enabled: bool,
    /// Setpoints derived from the live config.
    pub thresholds: ControlThresholds,

    // -- Persistent across evaluations --
    /// Heater toggle clock and dwell minima.
    pub heater: ActuatorClock,
    /// Cooler toggle clock and dwell minima.
    pub cooler: ActuatorClock,

    // -- Outputs --
    /// Relay pair requested by the current state. Rewritten by every
    /// `on_enter`; the orchestrator applies it on committed transitions.
    pub commands: OutputCommands,
}

impl ControlContext {
    /// Fresh context: dwell clocks at the epoch, outputs off, reading at
    /// the disconnected sentinel until the first refresh.
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            reading_c: sensors::DISCONNECTED_C,
            heater_enabled: false,
            cooler_enabled: false,
            thresholds: ControlThresholds::derive(&ChamberConfig::default()),
            heater: ActuatorClock::default(),
            cooler: ActuatorClock::default(),
            commands: OutputCommands::idle(),
        }
    }

    /// Refresh the per-evaluation snapshot from the live config and the
    /// caller's clock. Dwell clocks keep their stamps; only the minima
    /// follow the config.
    pub fn refresh(&mut self, config: &ChamberConfig, reading_c: f32, now_ms: u64) {
        self.now_ms = now_ms;
        self.reading_c = reading_c;
        self.heater_enabled = config.enable_heater;
        self.cooler_enabled = config.enable_cooler;
        self.thresholds = ControlThresholds::derive(config);
        self.heater.min_on_ms = u64::from(config.min_heater_on_secs) * 1_000;
        self.heater.min_off_ms = u64::from(config.min_heater_off_secs) * 1_000;
        self.cooler.min_on_ms = u64::from(config.min_cooler_on_secs) * 1_000;
        self.cooler.min_off_ms = u64::from(config.min_cooler_off_secs) * 1_000;
    }

    /// `true` when the probe handed back the disconnected sentinel.
    pub fn sensor_fault(&self) -> bool {
        sensors::is_disconnected(self.reading_c)
    }

    /// Dwell guard and clock stamp in one step.
    ///
    /// Checks that the selected minimum has elapsed since the actuator's
    /// last committed toggle. On success the clock is stamped at `now_ms`
    /// and the caller must commit the transition it guarded; on failure
    /// nothing changes and the attempt simply repeats next evaluation.
    pub fn try_toggle(&mut self, actuator: Actuator, kind: DwellKind) -> bool {
        let clock = match actuator {
            Actuator::Heater => &mut self.heater,
            Actuator::Cooler => &mut self.cooler,
        };
        let min_ms = match kind {
            DwellKind::MinOn => clock.min_on_ms,
            DwellKind::MinOff => clock.min_off_ms,
        };
        if self.now_ms.saturating_sub(clock.last_toggle_ms) >= min_ms {
            clock.last_toggle_ms = self.now_ms;
            true
        } else {
            false
        }
    }
}

impl Default for ControlContext {
    fn default() -> Self {
        Self::new()
    }
}
