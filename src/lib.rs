//! Thrustbench firmware library.
//!
//! Bring-up controller for a single forward-only ESC/motor channel, driven
//! over a wired console or BLE (Nordic UART Service). Exposes the pure-logic
//! modules for integration testing and external inspection. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod channels;
pub mod config;
pub mod proto;
pub mod pulse;
pub mod ramp;
pub mod telemetry;

pub mod error;
mod pins;

// Re-export the ESP-IDF-backed modules so the crate compiles everywhere; the
// hardware implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;

pub use error::{Error, Result};
