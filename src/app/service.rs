//! Chamber service — the hexagonal core.
//!
//! [`ChamberService`] owns the thermostat machine, the conversion
//! scheduler, and a handle to the shared settings store. It exposes a
//! clean, hardware-agnostic API; all I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  SensorBusPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                    │        ChamberService        │
//!   ActuatorPort ◀── │  Thermostat · Scheduler      │
//!                    │  Thresholds · Dwell clocks   │
//!                    └──────────────┬───────────────┘
//!                                   │ read / update handler
//!                                   ▼
//!                          SettingsService<ChamberConfig>
//! ```

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, info};

use crate::config::ChamberConfig;
use crate::control::thresholds::ControlThresholds;
use crate::fsm::context::ControlContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{ControlState, Thermostat};
use crate::scheduler::SensorScheduler;
use crate::sensors::ProbeReading;
use crate::settings::SettingsService;

use super::events::{ChamberEvent, ChamberStatus};
use super::ports::{ActuatorPort, EventSink, SensorBusPort};

/// The chamber's settings store: one [`ChamberConfig`] shared between
/// the control tick and the embedding application's configuration paths.
pub type ChamberSettings = SettingsService<ChamberConfig>;

// ───────────────────────────────────────────────────────────────
// ChamberService
// ───────────────────────────────────────────────────────────────

/// Orchestrates the thermostat against the injected ports.
pub struct ChamberService {
    settings: Arc<ChamberSettings>,
    machine: Thermostat,
    ctx: ControlContext,
    scheduler: SensorScheduler,
    /// Bumped by the settings handler on every propagated update.
    config_epoch: Arc<AtomicU32>,
    /// Epoch the tick path has caught up to.
    seen_epoch: u32,
}

impl ChamberService {
    /// Construct the service around a shared settings store.
    ///
    /// Registers a non-removable update handler that flags the change
    /// for the next tick, so dynamic subscriber teardown in the
    /// embedding application can never detach the controller from its
    /// own configuration.
    pub fn new(settings: Arc<ChamberSettings>) -> Self {
        let config_epoch = Arc::new(AtomicU32::new(0));
        let epoch = Arc::clone(&config_epoch);
        settings.add_update_handler(
            move |origin_id| {
                epoch.fetch_add(1, Ordering::AcqRel);
                info!("chamber config updated (origin: {origin_id})");
            },
            false,
        );

        Self {
            settings,
            machine: Thermostat::new(build_state_table(), ControlState::Idle),
            ctx: ControlContext::new(),
            scheduler: SensorScheduler::default(),
            config_epoch,
            seen_epoch: 0,
        }
    }

    /// Service with a custom evaluation interval (tests, fast chambers).
    pub fn with_scheduler(settings: Arc<ChamberSettings>, scheduler: SensorScheduler) -> Self {
        let mut service = Self::new(settings);
        service.scheduler = scheduler;
        service
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the relay pair to the safe position, enter Idle, and fire
    /// the first conversion. Call once before ticking; the first
    /// evaluation lands one interval after `now_ms`.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorBusPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        hw.set_outputs(false, false);
        self.machine.start(&mut self.ctx);
        self.scheduler.request_next(hw, now_ms);
        sink.emit(&ChamberEvent::Started(self.machine.current_state()));
        info!("chamber service started in {:?}", self.machine.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: scheduler gate → read → evaluate → apply.
    ///
    /// Call once per loop iteration with a monotonic `now_ms`; the
    /// service early-returns until the conversion deadline passes, so
    /// the call is cheap at any loop rate. `hw` satisfies **both**
    /// [`SensorBusPort`] and [`ActuatorPort`] — one mutable borrow for
    /// the whole cycle.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorBusPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        // 1. Fold in any config change since the last tick.
        let epoch = self.config_epoch.load(Ordering::Acquire);
        if epoch != self.seen_epoch {
            self.seen_epoch = epoch;
            self.scheduler.expedite();
            debug!("config change pending, evaluation expedited");
        }

        // 2. Wait out the conversion interval.
        if !self.scheduler.is_due(now_ms) {
            return;
        }

        // 3. Snapshot config, read the chamber probe, refresh the context.
        let config = self.settings.read(|c| c.clone());
        let reading_c = hw.read_celsius(&config.chamber_sensor_address);
        self.ctx.refresh(&config, reading_c, now_ms);
        debug!(
            "evaluating {:.2}°C in {:?}",
            reading_c,
            self.machine.current_state()
        );

        // 4. Evaluate the state machine.
        let prev_state = self.machine.current_state();
        self.machine.tick(&mut self.ctx);
        let new_state = self.machine.current_state();

        // 5. Committed transitions drive the relay pair and the sink.
        if new_state != prev_state {
            let commands = self.ctx.commands;
            hw.set_outputs(commands.heater_on(), commands.cooler_on());
            sink.emit(&ChamberEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }

        // 6. Re-arm the next conversion regardless of what happened.
        self.scheduler.request_next(hw, now_ms);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build the read-only status snapshot for external reporting.
    ///
    /// Reads the two configured probes plus a full bus enumeration. The
    /// disconnected sentinel passes through as a reading wherever a
    /// probe is absent.
    pub fn status(&self, hw: &mut impl SensorBusPort) -> ChamberStatus {
        let config = self.settings.read(|c| c.clone());
        let thresholds = ControlThresholds::derive(&config);

        let chamber_temp_c = hw.read_celsius(&config.chamber_sensor_address);
        let ambient_temp_c = hw.read_celsius(&config.ambient_sensor_address);

        let mut probes = heapless::Vec::new();
        for address in hw.enumerate() {
            let temp_c = hw.read_celsius(&address);
            // Enumeration and snapshot share MAX_PROBES, so push cannot fail.
            let _ = probes.push(ProbeReading { address, temp_c });
        }

        ChamberStatus {
            state: self.machine.current_state(),
            target_temp: config.target_temp,
            enable_heater: config.enable_heater,
            enable_cooler: config.enable_cooler,
            chamber_sensor_address: config.chamber_sensor_address,
            ambient_sensor_address: config.ambient_sensor_address,
            thresholds,
            chamber_temp_c,
            ambient_temp_c,
            probes,
        }
    }

    /// Current control state.
    pub fn state(&self) -> ControlState {
        self.machine.current_state()
    }

    /// Handle to the shared settings store.
    pub fn settings(&self) -> &Arc<ChamberSettings> {
        &self.settings
    }
}
