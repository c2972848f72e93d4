//! Throttle service — the hexagonal core.
//!
//! [`ThrottleService`] owns the configuration, the ramp engine, and the CSV
//! gate; it is the **only** writer of control state. Transports never call
//! into it directly — they enqueue lines (`channels`), and the control loop
//! feeds them in here during its own tick.
//!
//! ```text
//!  line text ──▶ ┌──────────────────────────┐ ──▶ LineSink
//!                │     ThrottleService       │
//!  ActuatorPort ◀──  parse · ramp · clamp    │
//!                └──────────────────────────┘
//! ```
//!
//! Every pulse leaves through [`issue_pulse`](ThrottleService::issue_pulse),
//! the single point where the forward-only clamp is applied — raw `US`
//! injection included.

use log::{info, warn};

use crate::config::EscConfig;
use crate::proto;
use crate::pulse;
use crate::ramp::{RampEngine, TargetOutcome};
use crate::telemetry::{self, CsvLogger, StatusSnapshot};

use super::commands::{ButtonAction, Command};
use super::ports::{ActuatorPort, LineSink};

const HELP_LINES: &[&str] = &[
    "commands:",
    "  HELP STATUS ARM STOP|0 FULL|1",
    "  SET <pct 0..100>   RPM <rpm>   US <microseconds>",
    "  RAMP <ms 0..10000>",
    "  LOG START|STOP     LOG PERIOD <ms 20..10000>",
    "  DBG ON|OFF         LED ON|OFF",
    "  !B<id><state>      (button pad: 5=up 6=down 1=full 2=stop)",
];

/// The bring-up controller core.
pub struct ThrottleService {
    config: EscConfig,
    ramp: RampEngine,
    csv: CsvLogger,
    debug: bool,
    /// Wireless peer present; toggled only by BLE lifecycle events.
    connected: bool,
    /// Last pulse actually issued to the actuator (post-clamp).
    last_pulse_us: u16,
}

impl ThrottleService {
    /// Construct the service from a validated configuration.
    pub fn new(config: EscConfig) -> Self {
        debug_assert!(config.validate().is_ok());
        let ramp = RampEngine::new(config.default_ramp_ms);
        let csv = CsvLogger::new(config.default_log_period_ms);
        let last_pulse_us = config.us_neutral;
        Self {
            config,
            ramp,
            csv,
            debug: false,
            connected: false,
            last_pulse_us,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Record the wireless transport's connection state. Telemetry reads
    /// this; the pulse model never does.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        info!("BLE peer {}", if connected { "connected" } else { "gone" });
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: advance the ramp, issue the (clamped) pulse,
    /// then let the CSV gate fire if a row is due.
    ///
    /// Runs every loop iteration regardless of command activity; the ramp is
    /// driven by the measured `now_ms`, not by an assumed cadence.
    pub fn tick(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl LineSink) {
        let output_pct = self.ramp.tick(now_ms);
        let raw = pulse::percent_to_pulse(&self.config, output_pct.round() as u8);
        self.issue_pulse(raw, hw);

        if self.csv.should_emit(now_ms) {
            let row =
                telemetry::format_csv(now_ms, telemetry::CSV_PERIODIC_TAG, &self.snapshot());
            sink.send_line(&row);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Interpret one raw line from a transport. Diagnostics go back through
    /// `sink` to the line's origin; malformed input never changes state.
    pub fn handle_line(
        &mut self,
        now_ms: u64,
        line: &str,
        hw: &mut impl ActuatorPort,
        sink: &mut impl LineSink,
    ) {
        match proto::parse_line(line) {
            Ok(Some(cmd)) => {
                if self.debug {
                    sink.send_line(&format!("dbg: {cmd:?}"));
                }
                self.handle_command(now_ms, cmd, hw, sink);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("rejected line {line:?}: {e}");
                sink.send_line(&format!("err: {e}"));
            }
        }
    }

    /// Apply a parsed command.
    pub fn handle_command(
        &mut self,
        now_ms: u64,
        cmd: Command,
        hw: &mut impl ActuatorPort,
        sink: &mut impl LineSink,
    ) {
        match cmd {
            Command::Help => {
                for line in HELP_LINES {
                    sink.send_line(line);
                }
                self.emit_status(cmd.tag(), sink);
            }
            Command::Status => self.emit_status(cmd.tag(), sink),
            Command::Arm => {
                if !self.ramp.arm(now_ms) {
                    sink.send_line("already armed");
                }
                self.emit_status(cmd.tag(), sink);
            }
            Command::Stop => self.apply_target(0, cmd.tag(), sink),
            Command::Full => self.apply_target(100, cmd.tag(), sink),
            Command::Set(pct) => self.apply_target(pct, cmd.tag(), sink),
            Command::Rpm(rpm) => {
                let pct = pulse::percent_from_rpm(&self.config, rpm);
                self.apply_target(pct, cmd.tag(), sink);
            }
            Command::PulseUs(us) => {
                // Direct injection: clamped like every other pulse, and the
                // target is deliberately left alone.
                self.issue_pulse(us, hw);
                self.emit_status(cmd.tag(), sink);
            }
            Command::Ramp(ms) => {
                let applied = self.ramp.set_ramp_time(ms);
                info!("ramp time set to {applied} ms");
                self.emit_status(cmd.tag(), sink);
            }
            Command::Debug(on) => {
                self.debug = on;
                self.emit_status(cmd.tag(), sink);
            }
            Command::LogStart => {
                // Pure telemetry toggle — header instead of a status line.
                self.csv.start(now_ms);
                sink.send_line(telemetry::CSV_HEADER);
            }
            Command::LogStop => self.csv.stop(),
            Command::LogPeriod(ms) => {
                let applied = self.csv.set_period(ms);
                info!("log period set to {applied} ms");
                self.emit_status(cmd.tag(), sink);
            }
            Command::Led(on) => {
                hw.set_led(on);
                self.emit_status(cmd.tag(), sink);
            }
            Command::Button(action) => {
                let outcome = match action {
                    ButtonAction::Up => self.ramp.nudge_target(5),
                    ButtonAction::Down => self.ramp.nudge_target(-5),
                    ButtonAction::Full => self.ramp.set_target(100),
                    ButtonAction::Stop => self.ramp.set_target(0),
                };
                self.report_target_outcome(outcome, sink);
                self.emit_status(action.tag(), sink);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a point-in-time snapshot for telemetry.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            connected: self.connected,
            armed: self.ramp.is_ready(),
            target_pct: self.ramp.target_pct(),
            output_pct: self.ramp.output_pct(),
            pulse_us: self.last_pulse_us,
            rpm_est: pulse::rpm_estimate(&self.config, self.ramp.output_pct()),
            ramp_ms: self.ramp.ramp_time_ms(),
            log_enabled: self.csv.is_enabled(),
        }
    }

    pub fn config(&self) -> &EscConfig {
        &self.config
    }

    pub fn last_pulse_us(&self) -> u16 {
        self.last_pulse_us
    }

    // ── Internal ──────────────────────────────────────────────

    /// The single pulse-issue point. Every path — ramp output, debug
    /// injection — funnels through the forward-only clamp here.
    fn issue_pulse(&mut self, raw_us: u16, hw: &mut impl ActuatorPort) {
        let us = pulse::clamp_forward(&self.config, raw_us);
        hw.set_pulse_us(us);
        self.last_pulse_us = us;
    }

    fn apply_target(&mut self, pct: u8, tag: &str, sink: &mut impl LineSink) {
        let outcome = self.ramp.set_target(pct);
        self.report_target_outcome(outcome, sink);
        self.emit_status(tag, sink);
    }

    fn report_target_outcome(&self, outcome: TargetOutcome, sink: &mut impl LineSink) {
        match outcome {
            TargetOutcome::Applied => {}
            TargetOutcome::Deferred => {
                sink.send_line("not armed — target stored, output stays neutral");
            }
            TargetOutcome::ArmingInProgress => {
                sink.send_line("arming in progress — target unchanged");
            }
        }
    }

    fn emit_status(&self, tag: &str, sink: &mut impl LineSink) {
        sink.send_line(&telemetry::format_status(tag, &self.snapshot()));
    }
}
