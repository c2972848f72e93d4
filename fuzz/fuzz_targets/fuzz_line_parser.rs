//! Fuzz target: `proto::parse_line`
//!
//! Drives arbitrary text through the command parser and asserts that it
//! never panics and that every accepted numeric lands inside its documented
//! range — the guarantees the control loop relies on for untrusted BLE and
//! serial input.
//!
//! cargo fuzz run fuzz_line_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use thrustbench::app::commands::Command;
use thrustbench::proto::parse_line;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    match parse_line(line) {
        Ok(Some(cmd)) => match cmd {
            Command::Set(pct) => assert!(pct <= 100),
            Command::Ramp(ms) => assert!(ms <= 10_000),
            Command::Rpm(rpm) => assert!(rpm.is_finite()),
            _ => {}
        },
        // Rejections and no-ops are fine; panics are the bug class here.
        Ok(None) | Err(_) => {}
    }
});
