//! Chamberstat control core library.
//!
//! Pure-logic building blocks for the fermentation chamber thermostat:
//! the guarded settings store, hysteresis threshold derivation, the
//! control state machine, and the conversion scheduler. Transport,
//! persistence, and the one-wire bus driver belong to the embedding
//! application; everything in here runs on the host against mocks.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod fsm;
pub mod scheduler;
pub mod sensors;
pub mod settings;
