//! Integration tests for the chamber service pipeline.
//!
//! Exercises the full chain — scheduler gate, probe read, thermostat
//! evaluation, relay commands, event emission — against the recording
//! mock in [`crate::mock_hw`].

use std::sync::Arc;

use chamberstat::app::events::ChamberEvent;
use chamberstat::app::service::{ChamberService, ChamberSettings};
use chamberstat::config::ChamberConfig;
use chamberstat::fsm::ControlState;
use chamberstat::scheduler::SensorScheduler;
use chamberstat::sensors::{SensorAddress, DISCONNECTED_C};

use crate::mock_hw::{HwCall, MockHardware, RecordingSink};

const CHAMBER: SensorAddress = SensorAddress([0x28, 0xff, 0x64, 0x39, 0x05, 0x16, 0x03, 0xc2]);
const AMBIENT: SensorAddress = SensorAddress([0x28, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);

/// Evaluation interval used across these tests (ms).
const TICK_MS: u64 = 1_000;

/// A 20°C chamber with a ±2° band, disengage past target by half a
/// step (factor 1.5): heater 18 on / 17 off, cooler 22 on / 23 off.
/// Dwell friction is zeroed; tests that need it dial their own in.
fn test_config() -> ChamberConfig {
    ChamberConfig {
        chamber_sensor_address: CHAMBER,
        ambient_sensor_address: AMBIENT,
        target_temp: 20.0,
        hysteresis_low: 2.0,
        hysteresis_high: 2.0,
        hysteresis_factor: 1.5,
        min_heater_on_secs: 0,
        min_heater_off_secs: 0,
        min_cooler_on_secs: 0,
        min_cooler_off_secs: 0,
        enable_heater: true,
        enable_cooler: true,
    }
}

/// Build and start a service at t=0; the first evaluation is due at
/// `TICK_MS`.
fn make_chamber(config: ChamberConfig) -> (ChamberService, MockHardware, RecordingSink) {
    let settings = Arc::new(ChamberSettings::new(config));
    let mut service = ChamberService::with_scheduler(settings, SensorScheduler::new(TICK_MS));
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    service.start(0, &mut hw, &mut sink);
    (service, hw, sink)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn starts_idle_with_outputs_off_and_a_conversion_fired() {
    let (service, hw, sink) = make_chamber(test_config());

    assert_eq!(service.state(), ControlState::Idle);
    assert_eq!(hw.outputs(), (false, false));
    assert_eq!(hw.conversions(), 1);
    assert!(matches!(sink.events[0], ChamberEvent::Started(ControlState::Idle)));
}

#[test]
fn first_evaluation_waits_one_interval() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 17.5);

    // Deadline is at 1000ms; ticks before it do nothing.
    service.tick(500, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Idle);
    assert_eq!(hw.conversions(), 1);

    service.tick(1_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Heating);
    assert_eq!(hw.conversions(), 2);
}

// ── Control cycles ────────────────────────────────────────────

#[test]
fn cold_chamber_engages_the_heater() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 17.5);

    service.tick(1_000, &mut hw, &mut sink);

    assert_eq!(service.state(), ControlState::Heating);
    assert_eq!(hw.outputs(), (true, false));
    assert_eq!(
        sink.state_changes(),
        vec![(ControlState::Idle, ControlState::Heating)]
    );
}

#[test]
fn warm_chamber_engages_the_cooler() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 23.0);

    service.tick(1_000, &mut hw, &mut sink);

    assert_eq!(service.state(), ControlState::Cooling);
    assert_eq!(hw.outputs(), (false, true));
}

#[test]
fn heater_holds_until_the_disengage_threshold() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 17.5);
    service.tick(1_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Heating);

    // Still below heater_off (17.0): keep driving.
    hw.set_reading(CHAMBER, 16.8);
    service.tick(2_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Heating);
    assert_eq!(hw.outputs(), (true, false));

    // At the threshold: disengage.
    hw.set_reading(CHAMBER, 17.0);
    service.tick(3_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Idle);
    assert_eq!(hw.outputs(), (false, false));
    assert_eq!(
        sink.state_changes(),
        vec![
            (ControlState::Idle, ControlState::Heating),
            (ControlState::Heating, ControlState::Idle),
        ]
    );
}

#[test]
fn every_evaluation_rearms_the_next_conversion() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 20.0); // band interior, no transitions

    for t in [1_000, 2_000, 3_000, 4_000] {
        service.tick(t, &mut hw, &mut sink);
    }

    // One from start plus one per due evaluation.
    assert_eq!(hw.conversions(), 5);
    assert!(sink.state_changes().is_empty());
}

#[test]
fn steady_state_commands_no_relay_writes() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 20.0);

    service.tick(1_000, &mut hw, &mut sink);
    service.tick(2_000, &mut hw, &mut sink);

    // Only the safe-position write from start().
    let relay_writes = hw
        .calls
        .iter()
        .filter(|c| matches!(c, HwCall::SetOutputs { .. }))
        .count();
    assert_eq!(relay_writes, 1);
}

// ── Dwell protection ──────────────────────────────────────────

#[test]
fn min_on_dwell_blocks_an_early_exit() {
    let config = ChamberConfig {
        min_heater_on_secs: 300,
        ..test_config()
    };
    let (mut service, mut hw, mut sink) = make_chamber(config);

    hw.set_reading(CHAMBER, 17.5);
    service.tick(1_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Heating);

    // Warm enough to disengage, but only 299s into the run.
    hw.set_reading(CHAMBER, 21.0);
    service.tick(300_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Heating);
    assert_eq!(hw.outputs(), (true, false));

    // 301s into the run the guard passes.
    service.tick(302_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Idle);
    assert_eq!(hw.outputs(), (false, false));
}

#[test]
fn boot_counts_as_a_toggle_for_min_off() {
    let config = ChamberConfig {
        min_cooler_off_secs: 120,
        ..test_config()
    };
    let (mut service, mut hw, mut sink) = make_chamber(config);

    // Hot from the first evaluation, but the cooler rests until 120s
    // after the epoch.
    hw.set_reading(CHAMBER, 25.0);
    service.tick(1_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Idle);

    service.tick(120_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Cooling);
}

// ── Probe faults ──────────────────────────────────────────────

#[test]
fn fault_reading_never_engages_outputs() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    // CHAMBER was never scripted, so reads return the sentinel.

    service.tick(1_000, &mut hw, &mut sink);
    service.tick(2_000, &mut hw, &mut sink);

    assert_eq!(service.state(), ControlState::Idle);
    assert_eq!(hw.outputs(), (false, false));
}

#[test]
fn probe_loss_mid_heat_forces_shutdown() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 17.5);
    service.tick(1_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Heating);

    hw.disconnect(&CHAMBER);
    service.tick(2_000, &mut hw, &mut sink);

    assert_eq!(service.state(), ControlState::Idle);
    assert_eq!(hw.outputs(), (false, false));
}

// ── Configuration changes ─────────────────────────────────────

#[test]
fn config_update_expedites_the_next_evaluation() {
    let config = ChamberConfig {
        enable_cooler: false,
        ..test_config()
    };
    let (mut service, mut hw, mut sink) = make_chamber(config);

    hw.set_reading(CHAMBER, 25.0);
    service.tick(1_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Idle, "cooler disabled");

    // Enable the cooler; the deadline sits at 2000ms but the change
    // must take effect on the very next tick.
    service
        .settings()
        .update(|c| c.enable_cooler = true, "test-rig");
    service.tick(1_500, &mut hw, &mut sink);

    assert_eq!(service.state(), ControlState::Cooling);
    assert_eq!(hw.outputs(), (false, true));
}

#[test]
fn silent_update_waits_for_the_regular_deadline() {
    let config = ChamberConfig {
        enable_cooler: false,
        ..test_config()
    };
    let (mut service, mut hw, mut sink) = make_chamber(config);

    hw.set_reading(CHAMBER, 25.0);
    service.tick(1_000, &mut hw, &mut sink);

    service.settings().update_silent(|c| c.enable_cooler = true);
    service.tick(1_500, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Idle, "no expedite without notification");

    service.tick(2_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Cooling);
}

#[test]
fn setpoint_change_takes_effect_without_waiting() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 19.0);
    service.tick(1_000, &mut hw, &mut sink);
    assert_eq!(service.state(), ControlState::Idle);

    // Raising the target to 24 puts heater_on at 22, above the 19.0
    // reading.
    service
        .settings()
        .update(|c| c.target_temp = 24.0, "http");
    service.tick(1_100, &mut hw, &mut sink);

    assert_eq!(service.state(), ControlState::Heating);
}

// ── Status snapshot ───────────────────────────────────────────

#[test]
fn status_reports_config_thresholds_and_probes() {
    let (mut service, mut hw, mut sink) = make_chamber(test_config());
    hw.set_reading(CHAMBER, 19.5);
    hw.set_reading(AMBIENT, 22.25);
    service.tick(1_000, &mut hw, &mut sink);

    let status = service.status(&mut hw);

    assert_eq!(status.state, ControlState::Idle);
    assert!((status.target_temp - 20.0).abs() < 1e-6);
    assert!(status.enable_heater);
    assert_eq!(status.chamber_sensor_address, CHAMBER);
    assert_eq!(status.ambient_sensor_address, AMBIENT);
    assert!((status.thresholds.heater_on_temp - 18.0).abs() < 1e-6);
    assert!((status.thresholds.heater_off_temp - 17.0).abs() < 1e-6);
    assert!((status.thresholds.cooler_on_temp - 22.0).abs() < 1e-6);
    assert!((status.thresholds.cooler_off_temp - 23.0).abs() < 1e-6);
    assert!((status.chamber_temp_c - 19.5).abs() < 1e-6);
    assert!((status.ambient_temp_c - 22.25).abs() < 1e-6);

    assert_eq!(status.probes.len(), 2);
    assert!(status.probes.iter().any(|p| p.address == CHAMBER));
    assert!(status.probes.iter().any(|p| p.address == AMBIENT));
}

#[test]
fn status_passes_the_sentinel_through_for_missing_probes() {
    let (service, mut hw, _sink) = make_chamber(test_config());

    let status = service.status(&mut hw);

    assert!((status.chamber_temp_c - DISCONNECTED_C).abs() < 1e-6);
    assert!((status.ambient_temp_c - DISCONNECTED_C).abs() < 1e-6);
    assert!(status.probes.is_empty());
}

#[test]
fn status_serializes_addresses_as_hex_strings() {
    let (service, mut hw, _sink) = make_chamber(test_config());
    let status = service.status(&mut hw);

    let json = serde_json::to_value(&status).expect("status serializes");
    assert_eq!(
        json["chamber_sensor_address"].as_str(),
        Some("28ff6439051603c2")
    );
    assert_eq!(json["state"].as_str(), Some("Idle"));
    assert!(json["thresholds"]["heater_on_temp"].is_number());
}
