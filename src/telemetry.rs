//! Telemetry formatting: human status lines and the periodic CSV stream.
//!
//! Both shapes are pure functions of a [`StatusSnapshot`]; the service
//! assembles the snapshot, this module renders it. Emission is
//! fire-and-forget — if a transport is backed up the line is dropped by the
//! sink, never queued.

use std::fmt::Write;

use crate::config::{LOG_PERIOD_MAX_MS, LOG_PERIOD_MIN_MS};

/// CSV schema. Field order is a compatibility contract with downstream
/// plotting tools — do not reorder.
pub const CSV_HEADER: &str = "t_ms,tag,connected,armed,targetPct,outputPct,pulse_us,rpm_est";

/// Tag used on periodic CSV rows (as opposed to command-triggered status).
pub const CSV_PERIODIC_TAG: &str = "log";

/// A point-in-time view of control state, read-only for telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub connected: bool,
    pub armed: bool,
    pub target_pct: u8,
    pub output_pct: f32,
    pub pulse_us: u16,
    pub rpm_est: f32,
    pub ramp_ms: u32,
    pub log_enabled: bool,
}

/// Render the human-readable status line for a command tag.
pub fn format_status(tag: &str, snap: &StatusSnapshot) -> String {
    format!(
        "[{tag}] conn={} armed={} tgt={}% out={:.1}% pulse={}us rpm~{:.0} ramp={}ms log={}",
        u8::from(snap.connected),
        u8::from(snap.armed),
        snap.target_pct,
        snap.output_pct,
        snap.pulse_us,
        snap.rpm_est,
        snap.ramp_ms,
        if snap.log_enabled { "on" } else { "off" },
    )
}

/// Render one CSV row. `t_ms` is milliseconds since boot.
pub fn format_csv(t_ms: u64, tag: &str, snap: &StatusSnapshot) -> String {
    let mut line = String::with_capacity(64);
    // Infallible for String; write! keeps the row in one pass.
    let _ = write!(
        line,
        "{t_ms},{tag},{},{},{},{:.1},{},{:.0}",
        u8::from(snap.connected),
        u8::from(snap.armed),
        snap.target_pct,
        snap.output_pct,
        snap.pulse_us,
        snap.rpm_est,
    );
    line
}

/// Period gate for the CSV stream.
///
/// Independent of control state; reads it, never writes it.
pub struct CsvLogger {
    enabled: bool,
    period_ms: u32,
    last_emit_ms: u64,
}

impl CsvLogger {
    pub fn new(period_ms: u32) -> Self {
        Self {
            enabled: false,
            period_ms: period_ms.clamp(LOG_PERIOD_MIN_MS, LOG_PERIOD_MAX_MS),
            last_emit_ms: 0,
        }
    }

    /// Enable the stream. The first row follows one full period after `now`.
    pub fn start(&mut self, now_ms: u64) {
        self.enabled = true;
        self.last_emit_ms = now_ms;
    }

    pub fn stop(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the period (ms), clamped to the valid range. Returns the value
    /// actually applied.
    pub fn set_period(&mut self, ms: u32) -> u32 {
        self.period_ms = ms.clamp(LOG_PERIOD_MIN_MS, LOG_PERIOD_MAX_MS);
        self.period_ms
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Check the gate. Returns `true` (and advances the emission timestamp)
    /// when a row is due.
    pub fn should_emit(&mut self, now_ms: u64) -> bool {
        if !self.enabled {
            return false;
        }
        if now_ms.saturating_sub(self.last_emit_ms) >= u64::from(self.period_ms) {
            self.last_emit_ms = now_ms;
            return true;
        }
        false
    }
}
