//! System configuration parameters
//!
//! All tunable parameters for the thrustbench controller. Constructed once at
//! startup and read-only thereafter; the control loop owns the only copy.

use serde::{Deserialize, Serialize};

/// Lower bound for the CSV logging period (ms).
pub const LOG_PERIOD_MIN_MS: u32 = 20;
/// Upper bound for the CSV logging period (ms).
pub const LOG_PERIOD_MAX_MS: u32 = 10_000;
/// Upper bound for the ramp time (ms). 0 means step changes.
pub const RAMP_TIME_MAX_MS: u32 = 10_000;

/// Core ESC/throttle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscConfig {
    // --- Pulse-width bounds (µs) ---
    /// Lowest pulse the ESC accepts at all.
    pub us_min: u16,
    /// Highest pulse the ESC accepts at all.
    pub us_max: u16,
    /// "No motion" pulse — safety default and the zero-throttle encoding.
    pub us_neutral: u16,
    /// Bottom of the forward band; pulses below it are forced to neutral.
    pub us_min_fwd: u16,
    /// Top of the forward band; pulses above it are capped here.
    pub us_max_fwd: u16,

    // --- Open-loop speed estimate (display only, never safety-relevant) ---
    /// Motor KV constant (rpm per volt, unloaded).
    pub kv_rpm_per_volt: f32,
    /// Assumed supply voltage (no battery sensing on the bench).
    pub supply_voltage: f32,

    // --- Defaults for runtime-adjustable knobs ---
    /// Default full-range ramp time (ms); `RAMP` adjusts it at runtime.
    pub default_ramp_ms: u32,
    /// Default CSV logging period (ms); `LOG PERIOD` adjusts it at runtime.
    pub default_log_period_ms: u32,

    // --- Timing ---
    /// Control loop interval (ms). The ramp is driven by measured elapsed
    /// time, so this is a target cadence, not an assumption.
    pub control_loop_interval_ms: u32,
}

impl Default for EscConfig {
    fn default() -> Self {
        Self {
            // Generic forward-only ESC: 1000–2000 µs signal range, motor
            // dead-band up to ~1100 µs, slight headroom below full scale.
            us_min: 1000,
            us_max: 2000,
            us_neutral: 1100,
            us_min_fwd: 1100,
            us_max_fwd: 1960,

            // 2212/920KV on a 3S pack.
            kv_rpm_per_volt: 920.0,
            supply_voltage: 11.1,

            default_ramp_ms: 1000,
            default_log_period_ms: 100,

            control_loop_interval_ms: 5,
        }
    }
}

impl EscConfig {
    /// Validate the pulse-bound chain and timing ranges.
    ///
    /// Invariant: `us_min <= us_min_fwd <= us_neutral <= us_max_fwd <= us_max`.
    /// A config violating it could let the forward-only clamp emit a pulse the
    /// ESC interprets as something other than "stopped or forward".
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.us_min > self.us_min_fwd {
            return Err("us_min must not exceed us_min_fwd");
        }
        if self.us_min_fwd > self.us_neutral {
            return Err("us_min_fwd must not exceed us_neutral");
        }
        if self.us_neutral > self.us_max_fwd {
            return Err("us_neutral must not exceed us_max_fwd");
        }
        if self.us_max_fwd > self.us_max {
            return Err("us_max_fwd must not exceed us_max");
        }
        if self.default_ramp_ms > RAMP_TIME_MAX_MS {
            return Err("default_ramp_ms out of range");
        }
        if self.default_log_period_ms < LOG_PERIOD_MIN_MS
            || self.default_log_period_ms > LOG_PERIOD_MAX_MS
        {
            return Err("default_log_period_ms out of range");
        }
        if self.control_loop_interval_ms == 0 {
            return Err("control_loop_interval_ms must be nonzero");
        }
        Ok(())
    }

    /// Unloaded full-throttle speed estimate (rpm).
    pub fn no_load_rpm(&self) -> f32 {
        self.kv_rpm_per_volt * self.supply_voltage
    }
}
