//! Concrete state handler functions and table builder.
//!
//! Each state is a pair of plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap. Update handlers evaluate their own dwell guard
//! through [`ControlContext::try_toggle`], so by the time a handler
//! returns `Some(next)` the transition is committed and the actuator
//! clock already stamped.
//!
//! ```text
//!            [reading ≤ heater_on, min-off elapsed]
//!     IDLE ─────────────────────────────────────────▶ HEATING
//!       ▲                                                │
//!       └───[reading ≥ heater_off | fault | disabled]────┘
//!                      (gated by min-on)
//!
//!            [reading ≥ cooler_on, min-off elapsed]
//!     IDLE ─────────────────────────────────────────▶ COOLING
//!       ▲                                                │
//!       └───[reading ≤ cooler_off | fault | disabled]────┘
//!                      (gated by min-on)
//! ```
//!
//! A faulted probe never engages anything from Idle; from an active
//! state it forces the exit path, still gated by minimum-on so a fresh
//! heater run is not chopped short.

use log::{debug, info, warn};

use super::context::{Actuator, ControlContext, DwellKind, OutputCommands};
use super::{ControlState, StateDescriptor};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; ControlState::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: ControlState::Idle,
            name: "Idle",
            on_enter: idle_enter,
            on_update: idle_update,
        },
        // Index 1 — Heating
        StateDescriptor {
            id: ControlState::Heating,
            name: "Heating",
            on_enter: heating_enter,
            on_update: heating_update,
        },
        // Index 2 — Cooling
        StateDescriptor {
            id: ControlState::Cooling,
            name: "Cooling",
            on_enter: cooling_enter,
            on_update: cooling_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut ControlContext) {
    ctx.commands = OutputCommands::idle();
    info!("IDLE: heater off, cooler off");
}

fn idle_update(ctx: &mut ControlContext) -> Option<ControlState> {
    // A faulted probe never engages an actuator.
    if ctx.sensor_fault() {
        return None;
    }

    // Heater has priority. Its branch owns the whole evaluation whether
    // or not the dwell guard lets it commit, so an overlapping band
    // cannot flap between the two outputs.
    if ctx.heater_enabled && ctx.reading_c <= ctx.thresholds.heater_on_temp {
        if ctx.try_toggle(Actuator::Heater, DwellKind::MinOff) {
            return Some(ControlState::Heating);
        }
        debug!(
            "IDLE: heater engage blocked by min-off dwell at {:.2}°C",
            ctx.reading_c
        );
        return None;
    }

    if ctx.cooler_enabled && ctx.reading_c >= ctx.thresholds.cooler_on_temp {
        if ctx.try_toggle(Actuator::Cooler, DwellKind::MinOff) {
            return Some(ControlState::Cooling);
        }
        debug!(
            "IDLE: cooler engage blocked by min-off dwell at {:.2}°C",
            ctx.reading_c
        );
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HEATING state
// ═══════════════════════════════════════════════════════════════════════════

fn heating_enter(ctx: &mut ControlContext) {
    ctx.commands = OutputCommands::heating();
    info!(
        "HEATING: engaged at {:.2}°C, holding until {:.2}°C",
        ctx.reading_c, ctx.thresholds.heater_off_temp
    );
}

fn heating_update(ctx: &mut ControlContext) -> Option<ControlState> {
    let fault = ctx.sensor_fault();
    let disengage =
        !ctx.heater_enabled || fault || ctx.reading_c >= ctx.thresholds.heater_off_temp;
    if !disengage {
        return None;
    }

    if fault {
        warn!("HEATING: probe disconnected, requesting shutdown");
    }
    if ctx.try_toggle(Actuator::Heater, DwellKind::MinOn) {
        return Some(ControlState::Idle);
    }
    debug!("HEATING: disengage blocked by min-on dwell");
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLING state
// ═══════════════════════════════════════════════════════════════════════════

fn cooling_enter(ctx: &mut ControlContext) {
    ctx.commands = OutputCommands::cooling();
    info!(
        "COOLING: engaged at {:.2}°C, holding until {:.2}°C",
        ctx.reading_c, ctx.thresholds.cooler_off_temp
    );
}

fn cooling_update(ctx: &mut ControlContext) -> Option<ControlState> {
    let fault = ctx.sensor_fault();
    let disengage =
        !ctx.cooler_enabled || fault || ctx.reading_c <= ctx.thresholds.cooler_off_temp;
    if !disengage {
        return None;
    }

    if fault {
        warn!("COOLING: probe disconnected, requesting shutdown");
    }
    if ctx.try_toggle(Actuator::Cooler, DwellKind::MinOn) {
        return Some(ControlState::Idle);
    }
    debug!("COOLING: disengage blocked by min-on dwell");
    None
}
