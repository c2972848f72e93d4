//! Application layer: the hexagonal core of the bring-up controller.
//!
//! * [`commands`] — the discriminated command values produced by the parser.
//! * [`ports`] — traits crossed by every piece of I/O.
//! * [`service`] — the orchestrator that owns all control state.

pub mod commands;
pub mod ports;
pub mod service;
