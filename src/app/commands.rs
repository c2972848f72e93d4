//! Inbound commands to the throttle service.
//!
//! These are the tagged-variant results of parsing a protocol line
//! (`proto::parse_line`). Parsing and effecting are separate steps: the
//! [`ThrottleService`](super::service::ThrottleService) consumes these values
//! without ever touching raw text, which keeps both halves unit-testable
//! without I/O.

/// Actions a button event can map to. Each carries the trigger name used to
/// tag the follow-up status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Increment the target by 5 % (saturating at 100).
    Up,
    /// Decrement the target by 5 % (saturating at 0).
    Down,
    /// Set the target to 100 %.
    Full,
    /// Zero the target.
    Stop,
}

impl ButtonAction {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Full => "FULL",
            Self::Stop => "STOP",
        }
    }
}

/// Commands the transports can send into the control core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Print the command summary.
    Help,
    /// Emit a status line.
    Status,
    /// Start the arming hold.
    Arm,
    /// Zero the target (`STOP`, alias `0`).
    Stop,
    /// Target 100 % (`FULL`, alias `1`).
    Full,
    /// Set the target percentage (already clamped to 0–100).
    Set(u8),
    /// Set the target from a speed estimate (rpm), via the inverse KV map.
    Rpm(f32),
    /// Inject a raw pulse width (µs). Still passes the forward-only clamp;
    /// does not change the target.
    PulseUs(u16),
    /// Set the full-range ramp time in ms (already clamped to 0–10000).
    Ramp(u32),
    /// Toggle parsed-command debug echo.
    Debug(bool),
    /// Enable periodic CSV logging.
    LogStart,
    /// Disable periodic CSV logging.
    LogStop,
    /// Set the CSV logging period in ms (clamped to 20–10000 on apply).
    LogPeriod(u32),
    /// Indicator LED on/off.
    Led(bool),
    /// A pressed button from the `!B` micro-protocol.
    Button(ButtonAction),
}

impl Command {
    /// Tag used on the status line a successful command concludes with.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Help => "HELP",
            Self::Status => "STATUS",
            Self::Arm => "ARM",
            Self::Stop => "STOP",
            Self::Full => "FULL",
            Self::Set(_) => "SET",
            Self::Rpm(_) => "RPM",
            Self::PulseUs(_) => "US",
            Self::Ramp(_) => "RAMP",
            Self::Debug(_) => "DBG",
            Self::LogStart | Self::LogStop => "LOG",
            Self::LogPeriod(_) => "LOG",
            Self::Led(_) => "LED",
            Self::Button(action) => action.tag(),
        }
    }
}
