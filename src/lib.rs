//! ButtonLED firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod advertising;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod events;
pub mod fsm;
pub mod gatt;
pub mod pins;
pub mod scheduler;

mod error;

pub use error::{AdvertisingCall, BleError, Error, Result};

// Hardware-facing modules; the ESP-IDF implementations are guarded by
// cfg attributes inside, host builds get simulations.
pub mod adapters;
pub mod drivers;
