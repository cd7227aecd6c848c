//! Function-pointer state machine for the thermostat.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  StateTable                                            │
//! │  ┌──────────┬───────────┬───────────────────────────┐  │
//! │  │ state    │ on_enter  │ on_update                 │  │
//! │  ├──────────┼───────────┼───────────────────────────┤  │
//! │  │ Idle     │ fn(ctx)   │ fn(ctx) -> Option<State>  │  │
//! │  │ Heating  │ fn(ctx)   │ fn(ctx) -> Option<State>  │  │
//! │  │ Cooling  │ fn(ctx)   │ fn(ctx) -> Option<State>  │  │
//! │  └──────────┴───────────┴───────────────────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Each evaluation the engine calls `on_update` for the **current**
//! state.  A `Some(next)` return is a committed transition — the dwell
//! guard already passed inside the handler and the actuator clock is
//! stamped — so the engine switches the current pointer and runs
//! `on_enter` for the next state.  All handlers receive
//! `&mut ControlContext`, which carries the reading snapshot, derived
//! thresholds, dwell clocks, and output commands.

pub mod context;
pub mod states;

use context::ControlContext;
use log::info;
use serde::Serialize;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of thermostat states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ControlState {
    Idle = 0,
    Heating = 1,
    Cooling = 2,
}

impl ControlState {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 3;

    /// Convert a table index back to `ControlState`. Panics on
    /// out-of-range in debug builds; returns `Idle` in release (safe
    /// fallback, both outputs off).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Heating,
            2 => Self::Cooling,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions. These run exactly once per
/// transition and rewrite the output commands for the new state.
pub type StateActionFn = fn(&mut ControlContext);

/// Signature for the per-evaluation update handler.
/// Returns `Some(next)` to commit a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut ControlContext) -> Option<ControlState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: ControlState,
    pub name: &'static str,
    pub on_enter: StateActionFn,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// Thermostat engine
// ---------------------------------------------------------------------------

/// The thermostat state machine engine.
///
/// Owns the state table and the current-state pointer. The caller owns
/// the [`ControlContext`] and threads it through every call, refreshed
/// with a new reading snapshot before each tick.
pub struct Thermostat {
    /// Fixed-size table indexed by `ControlState as usize`.
    table: [StateDescriptor; ControlState::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Thermostat {
    /// Construct with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; ControlState::COUNT], initial: ControlState) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ControlContext) {
        info!("thermostat starting in state: {}", self.table[self.current].name);
        (self.table[self.current].on_enter)(ctx);
    }

    /// Advance by one evaluation.
    ///
    /// Calls `on_update` for the current state and, when it commits a
    /// transition, switches the pointer and runs `on_enter` for the next
    /// state. The caller compares [`current_state`](Self::current_state)
    /// around the call to observe committed transitions.
    pub fn tick(&mut self, ctx: &mut ControlContext) {
        if let Some(next_id) = (self.table[self.current].on_update)(ctx) {
            self.transition(next_id, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> ControlState {
        ControlState::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: ControlState, ctx: &mut ControlContext) {
        let next_idx = next_id as usize;

        info!(
            "thermostat transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        self.current = next_idx;
        (self.table[self.current].on_enter)(ctx);
    }
}
