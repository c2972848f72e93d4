//! Adapters — implementations of the port traits over real transports and
//! hardware.
//!
//! Each adapter is dual-target: ESP-IDF code behind `target_os = "espidf"`,
//! in-memory simulation everywhere else so the logic core tests on the host.

pub mod ble;
pub mod hardware;
pub mod serial;
