//! Conversion scheduling for the one-wire temperature bus.
//!
//! DS18B20-class probes convert asynchronously: firing a conversion and
//! collecting the result must be separated by the conversion time, so
//! the controller runs a request/collect cycle instead of blocking on
//! the bus:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │   request_next(bus, now) ──▶ bus.request_conversion()        │
//! │            │                 deadline = now + interval       │
//! │            ▼                                                 │
//! │   … ticks pass, is_due(now) == false, nothing happens …      │
//! │            ▼                                                 │
//! │   is_due(now) == true ──▶ evaluate the thermostat against    │
//! │            │              bus.read_celsius(..) (the last,    │
//! │            │              now complete, conversion)          │
//! │            ▼                                                 │
//! │   request_next(bus, now)                          ⟲ repeat   │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduler owns nothing but the deadline; the caller supplies the
//! clock and the bus port on every call, which keeps it independently
//! testable against a recording mock.

use log::debug;

use crate::app::ports::SensorBusPort;

/// Default spacing between controller evaluations (milliseconds).
///
/// A 12-bit conversion completes in 750 ms, so by the time the next
/// evaluation collects readings the conversion fired at the previous one
/// has long finished.
pub const CONVERSION_INTERVAL_MS: u64 = 5_000;

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Paces conversion requests and controller evaluations.
pub struct SensorScheduler {
    /// Spacing between evaluations (milliseconds).
    interval_ms: u64,
    /// Absolute deadline for the next evaluation (milliseconds).  Starts
    /// at zero, so a fresh scheduler is due immediately.
    next_evaluation_ms: u64,
}

impl SensorScheduler {
    /// Scheduler with a custom evaluation interval.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            next_evaluation_ms: 0,
        }
    }

    /// `true` once the recorded deadline has passed.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_evaluation_ms
    }

    /// Fire a conversion on the bus and push the deadline one interval
    /// out from `now_ms`.
    pub fn request_next(&mut self, bus: &mut impl SensorBusPort, now_ms: u64) {
        bus.request_conversion();
        self.next_evaluation_ms = now_ms.saturating_add(self.interval_ms);
        debug!("conversion requested, next evaluation in {}ms", self.interval_ms);
    }

    /// Pull the deadline in so the next [`is_due`](Self::is_due) check
    /// passes immediately.
    ///
    /// Used when a configuration change should take effect without
    /// waiting out the remaining interval. The expedited evaluation
    /// consumes the last converted readings, which is what the bus
    /// driver serves anyway.
    pub fn expedite(&mut self) {
        self.next_evaluation_ms = 0;
    }

    /// The configured evaluation interval (milliseconds).
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

impl Default for SensorScheduler {
    fn default() -> Self {
        Self::new(CONVERSION_INTERVAL_MS)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
