//! Port traits — the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ThrottleService (domain)
//! ```
//!
//! Driven adapters (the ESC output stage, each transport's outbound half)
//! implement these traits. The service consumes them via generics, so the
//! control core never touches hardware or a radio stack directly and the
//! whole thing tests with mocks.

// ───────────────────────────────────────────────────────────────
// Actuator port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the physical outputs.
///
/// The service calls `set_pulse_us` exactly once per tick (and once per `US`
/// injection) with a value that has already passed the forward-only clamp.
/// Implementations are dumb: no clamping, no policy.
pub trait ActuatorPort {
    /// Command the ESC signal line to the given pulse width (µs).
    fn set_pulse_us(&mut self, us: u16);

    /// Indicator LED on/off.
    fn set_led(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Line sink port (domain → transport)
// ───────────────────────────────────────────────────────────────

/// Outbound text port. One implementation per transport.
///
/// Fire-and-forget: implementations must never block the control loop. If
/// the peer is backed up or gone, the line is dropped, not queued.
pub trait LineSink {
    fn send_line(&mut self, line: &str);
}

/// Sink that discards everything; stands in for a disconnected transport.
pub struct NullSink;

impl LineSink for NullSink {
    fn send_line(&mut self, _line: &str) {}
}
