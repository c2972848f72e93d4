//! Thrustbench Firmware — Main Entry Point
//!
//! Bring-up controller for a single forward-only ESC channel. Hexagonal
//! layout: transports on the outside, one synchronous control loop in the
//! middle, pure logic in [`ThrottleService`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  Serial (UART1)     BLE NUS server     HardwareAdapter   │
//! │  (poll + sink)      (callback + sink)  (ESC PWM + LED)   │
//! │                                                          │
//! │  ──────────── line channel / port traits ────────────    │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │         ThrottleService (pure logic)               │  │
//! │  │  parse · arm/ramp · forward-only clamp · CSV       │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The BLE callback only enqueues; every piece of throttle state is read
//! and written on this loop's thread alone.

#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use thrustbench::adapters::ble::{self, BleSink};
use thrustbench::adapters::hardware::HardwareAdapter;
use thrustbench::adapters::serial::{self, LineAssembler, SerialSink};
use thrustbench::app::ports::LineSink;
use thrustbench::app::service::ThrottleService;
use thrustbench::channels::{Source, LINE_CHANNEL};
use thrustbench::config::EscConfig;
use thrustbench::drivers::hw_init;

/// Replies go back to the transport a command arrived on; periodic CSV rows
/// go to both so a dropped BLE link never silences the wired console.
struct TeeSink {
    serial: SerialSink,
    ble: BleSink,
}

impl LineSink for TeeSink {
    fn send_line(&mut self, line: &str) {
        self.serial.send_line(line);
        self.ble.send_line(line);
    }
}

fn uptime_ms() -> u64 {
    // SAFETY: esp_timer is started by the IDF runtime before main().
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() } as u64) / 1000
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  thrustbench v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = EscConfig::default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid ESC configuration: {e}"))?;
    info!(
        "pulse band: [{}..{}] µs, forward [{}..{}] µs, neutral {} µs",
        config.us_min, config.us_max, config.us_min_fwd, config.us_max_fwd, config.us_neutral
    );

    // ── 3. Hardware bring-up ──────────────────────────────────
    // The ESC must see a valid neutral signal before anything else runs.
    hw_init::init_peripherals().map_err(|e| anyhow::anyhow!("peripheral init failed: {e}"))?;
    let mut hw = HardwareAdapter::new(config.us_neutral);

    // ── 4. Transports ─────────────────────────────────────────
    serial::start()?;
    ble::start()?;
    let mut assembler = LineAssembler::new();
    let mut serial_sink = SerialSink::new();
    let mut ble_sink = BleSink::new();
    let mut tee = TeeSink {
        serial: SerialSink::new(),
        ble: BleSink::new(),
    };

    // ── 5. Service + banner ───────────────────────────────────
    let loop_interval_ms = config.control_loop_interval_ms;
    let mut service = ThrottleService::new(config);
    serial_sink.send_line("thrustbench ready — HELP for commands, ARM before throttle");

    info!("entering control loop ({} ms tick)", loop_interval_ms);

    // ── 6. Control loop ───────────────────────────────────────
    //
    // Sole mutator of throttle state. Everything is driven off measured
    // uptime, so a late tick ramps by the real elapsed time.
    let mut was_connected = false;
    loop {
        let now_ms = uptime_ms();

        // Connection flag is owned by the BLE callbacks; latch it here so
        // telemetry inside this tick is self-consistent.
        let connected = ble::is_connected();
        if connected != was_connected {
            service.set_connected(connected);
            was_connected = connected;
        }

        // Wired bytes → lines → channel.
        serial::poll(&mut assembler);

        // Drain every queued line, replying to the transport it came from.
        while let Ok(msg) = LINE_CHANNEL.try_receive() {
            match msg.source {
                Source::Serial => {
                    service.handle_line(now_ms, msg.line.as_str(), &mut hw, &mut serial_sink);
                }
                Source::Ble => {
                    service.handle_line(now_ms, msg.line.as_str(), &mut hw, &mut ble_sink);
                }
            }
        }

        // Ramp, clamp, pulse, and (if due) a CSV row to both peers.
        service.tick(now_ms, &mut hw, &mut tee);

        esp_idf_hal::delay::FreeRtos::delay_ms(loop_interval_ms);
    }
}
