//! Ramp engine — rate-limited target tracking for the throttle output.
//!
//! Three-state machine driven once per control tick:
//!
//! ```text
//! Unarmed ──ARM──▶ Arming (neutral hold, loop keeps ticking) ──▶ Ready
//! ```
//!
//! While not `Ready` the output is forced to zero and the service issues the
//! neutral pulse. Once `Ready`, each tick moves the continuous output toward
//! the target by at most `100 * dt / ramp_time_ms` percent, computed from
//! measured elapsed time — never from an assumed cadence — so abrupt target
//! changes always produce bounded-rate throttle changes.

use log::info;

use crate::config::RAMP_TIME_MAX_MS;

/// Neutral hold duration after `ARM` before throttle commands take effect.
/// Modeled as a state, not a busy-wait, so command intake never starves.
pub const ARM_HOLD_MS: u64 = 2000;

/// Arming lifecycle. There is no modeled path back to `Unarmed` short of a
/// restart; `ARM` while `Ready` is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    Unarmed,
    Arming { until_ms: u64 },
    Ready,
}

/// Outcome of a target-change request, decided by the arming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Target applied and tracked live.
    Applied,
    /// Target stored but output stays at zero until armed.
    Deferred,
    /// Rejected: the arming hold is in progress.
    ArmingInProgress,
}

pub struct RampEngine {
    state: ArmState,
    target_pct: u8,
    output_pct: f32,
    ramp_time_ms: u32,
    last_tick_ms: Option<u64>,
}

impl RampEngine {
    pub fn new(ramp_time_ms: u32) -> Self {
        Self {
            state: ArmState::Unarmed,
            target_pct: 0,
            output_pct: 0.0,
            ramp_time_ms: ramp_time_ms.min(RAMP_TIME_MAX_MS),
            last_tick_ms: None,
        }
    }

    // ── Arming ────────────────────────────────────────────────

    /// Begin the arming hold. Returns `false` if already arming or armed.
    pub fn arm(&mut self, now_ms: u64) -> bool {
        match self.state {
            ArmState::Unarmed => {
                self.state = ArmState::Arming {
                    until_ms: now_ms + ARM_HOLD_MS,
                };
                info!("arming: holding neutral for {ARM_HOLD_MS} ms");
                true
            }
            ArmState::Arming { .. } | ArmState::Ready => false,
        }
    }

    pub fn state(&self) -> ArmState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ArmState::Ready
    }

    // ── Target / ramp knobs ───────────────────────────────────

    /// Request a new target percentage (clamped to 0–100).
    pub fn set_target(&mut self, pct: u8) -> TargetOutcome {
        if matches!(self.state, ArmState::Arming { .. }) {
            return TargetOutcome::ArmingInProgress;
        }
        self.target_pct = pct.min(100);
        if self.is_ready() {
            TargetOutcome::Applied
        } else {
            TargetOutcome::Deferred
        }
    }

    /// Adjust the target by a signed step (button increments), saturating.
    pub fn nudge_target(&mut self, delta: i8) -> TargetOutcome {
        let next = (i16::from(self.target_pct) + i16::from(delta)).clamp(0, 100);
        self.set_target(next as u8)
    }

    pub fn target_pct(&self) -> u8 {
        self.target_pct
    }

    pub fn output_pct(&self) -> f32 {
        self.output_pct
    }

    /// Set the full-range ramp time (ms), clamped to the valid range.
    pub fn set_ramp_time(&mut self, ms: u32) -> u32 {
        self.ramp_time_ms = ms.min(RAMP_TIME_MAX_MS);
        self.ramp_time_ms
    }

    pub fn ramp_time_ms(&self) -> u32 {
        self.ramp_time_ms
    }

    // ── Per-tick update ───────────────────────────────────────

    /// Advance one control-loop tick and return the output percentage.
    ///
    /// `now_ms` must come from a monotonic clock. The caller converts the
    /// returned percentage to a pulse and issues it through the forward-only
    /// clamp.
    pub fn tick(&mut self, now_ms: u64) -> f32 {
        let dt = match self.last_tick_ms {
            Some(last) => now_ms.saturating_sub(last),
            None => 0,
        };
        self.last_tick_ms = Some(now_ms);

        match self.state {
            ArmState::Unarmed => {
                self.output_pct = 0.0;
            }
            ArmState::Arming { until_ms } => {
                self.output_pct = 0.0;
                if now_ms >= until_ms {
                    self.state = ArmState::Ready;
                    info!("arming complete — throttle commands live");
                }
            }
            ArmState::Ready => {
                let target = f32::from(self.target_pct);
                if self.ramp_time_ms == 0 || dt == 0 {
                    self.output_pct = target;
                } else {
                    let max_delta = 100.0 * dt as f32 / self.ramp_time_ms as f32;
                    let diff = target - self.output_pct;
                    if diff.abs() <= max_delta {
                        self.output_pct = target;
                    } else {
                        self.output_pct += max_delta.copysign(diff);
                    }
                }
                self.output_pct = self.output_pct.clamp(0.0, 100.0);
            }
        }

        self.output_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_engine(ramp_ms: u32) -> RampEngine {
        let mut e = RampEngine::new(ramp_ms);
        assert!(e.arm(0));
        e.tick(0);
        e.tick(ARM_HOLD_MS); // hold elapses
        assert!(e.is_ready());
        e
    }

    #[test]
    fn starts_unarmed_with_zero_output() {
        let mut e = RampEngine::new(1000);
        assert_eq!(e.state(), ArmState::Unarmed);
        assert_eq!(e.tick(100), 0.0);
    }

    #[test]
    fn unarmed_target_is_deferred() {
        let mut e = RampEngine::new(0);
        assert_eq!(e.set_target(80), TargetOutcome::Deferred);
        // Output stays at zero no matter how long we tick.
        for t in (0..100).step_by(5) {
            assert_eq!(e.tick(t), 0.0);
        }
        assert_eq!(e.target_pct(), 80);
    }

    #[test]
    fn arming_rejects_target_changes() {
        let mut e = RampEngine::new(1000);
        e.arm(0);
        assert_eq!(e.set_target(50), TargetOutcome::ArmingInProgress);
    }

    #[test]
    fn arming_completes_after_hold() {
        let mut e = RampEngine::new(1000);
        e.arm(1000);
        e.tick(1000);
        assert!(!e.is_ready());
        e.tick(1000 + ARM_HOLD_MS - 1);
        assert!(!e.is_ready());
        e.tick(1000 + ARM_HOLD_MS);
        assert!(e.is_ready());
    }

    #[test]
    fn rearm_is_noop() {
        let mut e = ready_engine(1000);
        assert!(!e.arm(10_000));
        assert!(e.is_ready());
    }

    #[test]
    fn zero_ramp_snaps_to_target() {
        let mut e = ready_engine(0);
        e.set_target(73);
        assert_eq!(e.tick(ARM_HOLD_MS + 5), 73.0);
    }

    #[test]
    fn ramp_limits_rate_and_never_overshoots() {
        let mut e = ready_engine(1000);
        e.set_target(100);
        let t0 = ARM_HOLD_MS;
        let mut prev = 0.0;
        // 5 ms ticks: 0.5 %/tick at ramp=1000 ms.
        for i in 1..=100u64 {
            let out = e.tick(t0 + i * 5);
            assert!(out >= prev, "output regressed");
            assert!(out <= 100.0);
            prev = out;
        }
        // 500 ms elapsed → half range covered.
        assert!((prev - 50.0).abs() < 0.6, "expected ~50, got {prev}");
        // Full range within ramp_time (+ one tick of slack).
        for i in 101..=202u64 {
            prev = e.tick(t0 + i * 5);
        }
        assert_eq!(prev, 100.0);
    }

    #[test]
    fn repeated_set_does_not_double_apply() {
        let mut e = ready_engine(1000);
        e.set_target(50);
        e.set_target(50);
        let out = e.tick(ARM_HOLD_MS + 10);
        assert!(out <= 1.1, "ramp distance double-applied: {out}");
        assert_eq!(e.target_pct(), 50);
    }

    #[test]
    fn ramps_down_as_well_as_up() {
        let mut e = ready_engine(0);
        e.set_target(100);
        e.tick(ARM_HOLD_MS + 5);
        e.set_ramp_time(1000);
        e.set_target(0);
        let out = e.tick(ARM_HOLD_MS + 105);
        assert!((out - 90.0).abs() < 0.1, "expected ~90, got {out}");
    }

    #[test]
    fn ramp_time_clamped_to_max() {
        let mut e = RampEngine::new(1000);
        assert_eq!(e.set_ramp_time(60_000), RAMP_TIME_MAX_MS);
    }

    #[test]
    fn nudge_saturates_both_ends() {
        let mut e = ready_engine(0);
        e.set_target(98);
        e.nudge_target(5);
        assert_eq!(e.target_pct(), 100);
        e.set_target(3);
        e.nudge_target(-5);
        assert_eq!(e.target_pct(), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_always_bounded_and_monotone_toward_target(
            target in 0u8..=100,
            ticks in proptest::collection::vec(1u64..50, 1..200),
        ) {
            let mut e = RampEngine::new(1000);
            e.arm(0);
            e.tick(0);
            let mut now = ARM_HOLD_MS;
            e.tick(now);
            e.set_target(target);

            let mut prev = e.output_pct();
            for dt in ticks {
                now += dt;
                let out = e.tick(now);
                prop_assert!((0.0..=100.0).contains(&out));
                // Fixed target: distance to target never grows.
                let target_f = f32::from(target);
                prop_assert!((target_f - out).abs() <= (target_f - prev).abs() + 1e-3);
                prev = out;
            }
        }
    }
}
