//! Hardware drivers (dumb actuator layer).
//!
//! Drivers hold no policy: clamping and arming live in the service. Each
//! driver compiles on the host with in-memory state only, and drives real
//! peripherals through `hw_init` on ESP-IDF.

pub mod esc;
pub mod hw_init;
pub mod status_led;
