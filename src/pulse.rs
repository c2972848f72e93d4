//! Pulse model — pure mapping between throttle percent, pulse width, and the
//! open-loop speed estimate.
//!
//! ## Forward-only policy
//!
//! Every pulse that reaches the ESC passes through [`clamp_forward`]: first
//! clamped to the accepted signal range, then anything below the forward band
//! snaps to neutral (never an intermediate "creeping" value) and anything
//! above the band caps at the band ceiling. The service applies this at the
//! single point where a pulse is issued, so no code path — including raw
//! `US` injection — can bypass it.

use crate::config::EscConfig;

/// Map a throttle percentage to a pulse width.
///
/// 0 % encodes as the neutral pulse; 1–100 % interpolates linearly across the
/// forward band with integer truncation.
pub fn percent_to_pulse(cfg: &EscConfig, pct: u8) -> u16 {
    let pct = u32::from(pct.min(100));
    if pct == 0 {
        return cfg.us_neutral;
    }
    let span = u32::from(cfg.us_max_fwd - cfg.us_min_fwd);
    cfg.us_min_fwd + (span * pct / 100) as u16
}

/// Apply the forward-only safety clamp to a raw pulse width.
pub fn clamp_forward(cfg: &EscConfig, us: u16) -> u16 {
    let us = us.clamp(cfg.us_min, cfg.us_max);
    if us < cfg.us_min_fwd {
        cfg.us_neutral
    } else if us > cfg.us_max_fwd {
        cfg.us_max_fwd
    } else {
        us
    }
}

/// Open-loop speed estimate for a throttle percentage (rpm, unloaded).
/// Display/debug only — never used for safety decisions.
pub fn rpm_estimate(cfg: &EscConfig, pct: f32) -> f32 {
    cfg.no_load_rpm() * pct / 100.0
}

/// Inverse of [`rpm_estimate`]: throttle percentage for a target speed.
///
/// Returns 0 for non-positive targets or a degenerate (near-zero) no-load
/// speed; the result is clamped to 0–100.
pub fn percent_from_rpm(cfg: &EscConfig, rpm: f32) -> u8 {
    let no_load = cfg.no_load_rpm();
    if rpm <= 0.0 || no_load < 1.0 {
        return 0;
    }
    let pct = (rpm / no_load * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
