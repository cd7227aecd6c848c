//! Actuator drivers and peripheral helpers.

pub mod relay;
