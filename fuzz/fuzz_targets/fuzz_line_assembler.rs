//! Fuzz target: `serial::LineAssembler`
//!
//! Feeds arbitrary byte streams through the UART line splitter and asserts
//! that every produced line fits the channel capacity and contains no
//! terminator bytes.
//!
//! cargo fuzz run fuzz_line_assembler

#![no_main]

use libfuzzer_sys::fuzz_target;
use thrustbench::adapters::serial::LineAssembler;
use thrustbench::channels::LINE_CAP;

fuzz_target!(|data: &[u8]| {
    let mut asm = LineAssembler::new();
    for &b in data {
        if let Some(line) = asm.push_byte(b) {
            assert!(line.len() <= LINE_CAP);
            assert!(!line.contains('\r') && !line.contains('\n'));
            assert!(!line.is_empty());
        }
    }
});
