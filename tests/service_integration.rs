//! End-to-end bench scenarios against the full service: raw protocol lines
//! in, pulses and telemetry lines out, with mocked hardware and transports.
//!
//! Host-only — everything here runs without ESP-IDF.

use thrustbench::app::ports::{ActuatorPort, LineSink};
use thrustbench::app::service::ThrottleService;
use thrustbench::config::EscConfig;
use thrustbench::ramp::ARM_HOLD_MS;
use thrustbench::telemetry::CSV_HEADER;

// ───────────────────────────────────────────────────────────────
// Mocks
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockHw {
    pulses: Vec<u16>,
    led: bool,
}

impl ActuatorPort for MockHw {
    fn set_pulse_us(&mut self, us: u16) {
        self.pulses.push(us);
    }
    fn set_led(&mut self, on: bool) {
        self.led = on;
    }
}

impl MockHw {
    fn last_pulse(&self) -> u16 {
        *self.pulses.last().expect("no pulse issued")
    }
}

#[derive(Default)]
struct MockSink {
    lines: Vec<String>,
}

impl LineSink for MockSink {
    fn send_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}

impl MockSink {
    fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
    fn csv_rows(&self) -> Vec<&String> {
        self.lines
            .iter()
            .filter(|l| l.split(',').nth(1) == Some("log"))
            .collect()
    }
}

struct Bench {
    svc: ThrottleService,
    hw: MockHw,
    sink: MockSink,
}

impl Bench {
    fn new() -> Self {
        Self {
            svc: ThrottleService::new(EscConfig::default()),
            hw: MockHw::default(),
            sink: MockSink::default(),
        }
    }

    fn line(&mut self, now_ms: u64, text: &str) {
        self.svc.handle_line(now_ms, text, &mut self.hw, &mut self.sink);
    }

    fn tick(&mut self, now_ms: u64) {
        self.svc.tick(now_ms, &mut self.hw, &mut self.sink);
    }

    /// Arm at `t0` and tick through the neutral hold.
    fn arm_and_wait(&mut self, t0: u64) -> u64 {
        self.tick(t0);
        self.line(t0, "ARM");
        let done = t0 + ARM_HOLD_MS;
        self.tick(done);
        done
    }
}

// ───────────────────────────────────────────────────────────────
// Arming and ramping
// ───────────────────────────────────────────────────────────────

#[test]
fn full_throttle_ramps_at_configured_rate() {
    let mut b = Bench::new();
    let t = b.arm_and_wait(0);

    // Default ramp is 1000 ms full range.
    b.line(t, "SET 100");
    b.tick(t + 500);
    // Halfway through the ramp: 50 % → midpoint of the forward band.
    let mid = b.hw.last_pulse();
    assert!((1500..=1560).contains(&mid), "expected ~1530 µs, got {mid}");

    b.tick(t + 1100);
    assert_eq!(b.hw.last_pulse(), 1960, "full throttle must cap at us_max_fwd");
}

#[test]
fn unarmed_throttle_stays_neutral_and_applies_after_arming() {
    let mut b = Bench::new();
    b.line(0, "SET 80");
    assert!(b.sink.contains("not armed"));

    for t in (0..500).step_by(50) {
        b.tick(t);
        assert_eq!(b.hw.last_pulse(), 1100, "unarmed output must stay neutral");
    }

    // The stored target takes effect once the hold completes.
    let t = b.arm_and_wait(500);
    b.tick(t + 2000);
    assert!(b.hw.last_pulse() > 1100);
    let snap = b.svc.snapshot();
    assert_eq!(snap.target_pct, 80);
}

#[test]
fn target_changes_during_arming_hold_are_rejected() {
    let mut b = Bench::new();
    b.tick(0);
    b.line(0, "ARM");
    b.line(100, "SET 60");
    assert!(b.sink.contains("arming in progress"));
    b.tick(ARM_HOLD_MS);
    assert_eq!(b.svc.snapshot().target_pct, 0);
}

#[test]
fn rearming_is_a_noop() {
    let mut b = Bench::new();
    let t = b.arm_and_wait(0);
    b.line(t, "ARM");
    assert!(b.sink.contains("already armed"));
    assert!(b.svc.snapshot().armed);
}

#[test]
fn repeated_set_is_idempotent() {
    let mut b = Bench::new();
    let t = b.arm_and_wait(0);
    b.line(t, "SET 50");
    b.line(t, "SET 50");
    b.line(t, "SET 50");
    b.tick(t + 2000);
    let settled = b.hw.last_pulse();
    b.line(t + 2000, "SET 50");
    b.tick(t + 2500);
    assert_eq!(b.hw.last_pulse(), settled);
    assert_eq!(b.svc.snapshot().target_pct, 50);
}

#[test]
fn stop_ramps_back_down_to_neutral() {
    let mut b = Bench::new();
    let t = b.arm_and_wait(0);
    b.line(t, "FULL");
    b.tick(t + 2000);
    assert_eq!(b.hw.last_pulse(), 1960);

    b.line(t + 2000, "STOP");
    b.tick(t + 2500);
    let mid = b.hw.last_pulse();
    assert!(mid > 1100 && mid < 1960, "ramp-down must be gradual, got {mid}");
    b.tick(t + 4000);
    assert_eq!(b.hw.last_pulse(), 1100);
}

// ───────────────────────────────────────────────────────────────
// Button pad
// ───────────────────────────────────────────────────────────────

#[test]
fn button_presses_drive_the_target() {
    let mut b = Bench::new();
    let t = b.arm_and_wait(0);

    b.line(t, "!B11"); // full
    assert_eq!(b.svc.snapshot().target_pct, 100);
    b.line(t, "!B61"); // down 5
    assert_eq!(b.svc.snapshot().target_pct, 95);
    b.line(t, "!B21"); // stop
    assert_eq!(b.svc.snapshot().target_pct, 0);
    b.line(t, "!B51"); // up 5
    assert_eq!(b.svc.snapshot().target_pct, 5);
}

#[test]
fn button_release_changes_nothing() {
    let mut b = Bench::new();
    let t = b.arm_and_wait(0);
    b.line(t, "!B11");
    let before = b.sink.lines.len();
    b.line(t, "!B10");
    assert_eq!(b.sink.lines.len(), before, "release must be silent");
    assert_eq!(b.svc.snapshot().target_pct, 100);
}

#[test]
fn unknown_button_press_is_diagnosed() {
    let mut b = Bench::new();
    b.line(0, "!B91");
    assert!(b.sink.contains("err:"));
    assert_eq!(b.svc.snapshot().target_pct, 0);
}

// ───────────────────────────────────────────────────────────────
// Telemetry
// ───────────────────────────────────────────────────────────────

#[test]
fn csv_stream_emits_header_then_periodic_rows() {
    let mut b = Bench::new();
    let t = b.arm_and_wait(0);

    b.line(t, "LOG PERIOD 100");
    b.line(t, "LOG START");
    assert!(b.sink.lines.iter().any(|l| l == CSV_HEADER));

    // 5 ms loop cadence over 350 ms → rows at +100, +200, +300.
    for i in 1..=70u64 {
        b.tick(t + i * 5);
    }
    let rows = b.sink.csv_rows();
    assert_eq!(rows.len(), 3, "expected 3 periodic rows, got {rows:?}");
    for row in &rows {
        assert_eq!(row.split(',').count(), CSV_HEADER.split(',').count());
    }

    b.line(t + 350, "LOG STOP");
    let count = b.sink.csv_rows().len();
    for i in 71..=140u64 {
        b.tick(t + i * 5);
    }
    assert_eq!(b.sink.csv_rows().len(), count, "stream must stop cleanly");
}

#[test]
fn status_reports_connection_and_arming() {
    let mut b = Bench::new();
    b.line(0, "STATUS");
    assert!(b.sink.contains("conn=0 armed=0"));

    b.svc.set_connected(true);
    let t = b.arm_and_wait(0);
    b.line(t, "STATUS");
    assert!(b.sink.contains("conn=1 armed=1"));
}

#[test]
fn help_lists_every_keyword() {
    let mut b = Bench::new();
    b.line(0, "HELP");
    let text = b.sink.lines.join("\n");
    for kw in ["ARM", "SET", "RPM", "US", "RAMP", "LOG", "DBG", "LED", "!B"] {
        assert!(text.contains(kw), "HELP missing {kw}");
    }
}

// ───────────────────────────────────────────────────────────────
// Debug pulse injection
// ───────────────────────────────────────────────────────────────

#[test]
fn us_injection_passes_the_forward_only_clamp() {
    let mut b = Bench::new();
    // Above the forward band: capped.
    b.line(0, "US 2400");
    assert_eq!(b.hw.last_pulse(), 1960);
    // Below the forward band: forced to neutral, never a creeping value.
    b.line(0, "US 1050");
    assert_eq!(b.hw.last_pulse(), 1100);
    // Inside the band: passes through.
    b.line(0, "US 1500");
    assert_eq!(b.hw.last_pulse(), 1500);
}

#[test]
fn debug_echo_toggles() {
    let mut b = Bench::new();
    b.line(0, "DBG ON");
    b.line(0, "STATUS");
    assert!(b.sink.contains("dbg: Status"));
    b.line(0, "DBG OFF");
    let count = b.sink.lines.iter().filter(|l| l.starts_with("dbg:")).count();
    b.line(0, "STATUS");
    assert_eq!(
        b.sink.lines.iter().filter(|l| l.starts_with("dbg:")).count(),
        count
    );
}

// ───────────────────────────────────────────────────────────────
// Malformed input
// ───────────────────────────────────────────────────────────────

#[test]
fn malformed_lines_never_change_state() {
    let mut b = Bench::new();
    let t = b.arm_and_wait(0);
    b.line(t, "SET 30");
    b.tick(t + 2000);
    let settled = b.hw.last_pulse();

    for bad in ["SET abc", "FROBNICATE", "RPM x", "!B5", "LOG NOPE"] {
        b.line(t + 2000, bad);
        assert!(b.sink.contains("err:"), "no diagnostic for {bad:?}");
    }
    b.tick(t + 2500);
    assert_eq!(b.hw.last_pulse(), settled);
    assert_eq!(b.svc.snapshot().target_pct, 30);
}
