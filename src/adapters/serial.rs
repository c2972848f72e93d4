//! Wired serial (UART) transport adapter.
//!
//! The bench console: a UART polled from the control loop. Received bytes
//! are assembled into lines host-side-testably by [`LineAssembler`]; each
//! completed line is enqueued on [`crate::channels::LINE_CHANNEL`] exactly
//! like a BLE write, so the interpreter sees one uniform stream.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: UART1 via raw ESP-IDF sys calls.
//! - **all other targets**: no hardware; [`LineAssembler`] and the sink
//!   formatting still run for tests.

use log::info;

use crate::app::ports::LineSink;
use crate::channels::{self, Source, LINE_CAP};

#[cfg(target_os = "espidf")]
use crate::pins;

const BAUD_RATE: u32 = 115_200;

#[cfg(target_os = "espidf")]
const UART_PORT: u32 = 1;
#[cfg(target_os = "espidf")]
const UART_RX_BUF: i32 = 256;

// ───────────────────────────────────────────────────────────────
// Line assembly
// ───────────────────────────────────────────────────────────────

/// Byte-stream → line splitter for the wired console.
///
/// CR and LF both terminate a line (so CRLF terminals produce no empty
/// ghost lines). Input beyond [`LINE_CAP`] bytes is clipped; the clipped
/// line is still delivered when the terminator finally arrives.
pub struct LineAssembler {
    buf: heapless::String<LINE_CAP>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            buf: heapless::String::new(),
        }
    }

    /// Feed one received byte. Returns a completed line when `b` terminates
    /// one, otherwise `None`.
    pub fn push_byte(&mut self, b: u8) -> Option<heapless::String<LINE_CAP>> {
        match b {
            b'\r' | b'\n' => {
                if self.buf.is_empty() {
                    None
                } else {
                    let line = self.buf.clone();
                    self.buf.clear();
                    Some(line)
                }
            }
            _ => {
                // Silently clip past capacity; terminator still flushes.
                let _ = self.buf.push(b as char);
                None
            }
        }
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// UART bring-up and polling
// ───────────────────────────────────────────────────────────────

/// Install the UART driver for the wired console. Called once from `main()`.
#[cfg(target_os = "espidf")]
pub fn start() -> crate::Result<()> {
    use crate::error::{CommsError, Error};
    use esp_idf_svc::sys::*;

    let cfg = uart_config_t {
        baud_rate: BAUD_RATE as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    // SAFETY: one-shot init from main() before the control loop.
    unsafe {
        if uart_param_config(UART_PORT as i32, &cfg) != ESP_OK as i32 {
            return Err(Error::Comms(CommsError::UartInitFailed));
        }
        if uart_set_pin(
            UART_PORT as i32,
            pins::UART_TX_GPIO,
            pins::UART_RX_GPIO,
            -1,
            -1,
        ) != ESP_OK as i32
        {
            return Err(Error::Comms(CommsError::UartInitFailed));
        }
        if uart_driver_install(UART_PORT as i32, UART_RX_BUF, 0, 0, core::ptr::null_mut(), 0)
            != ESP_OK as i32
        {
            return Err(Error::Comms(CommsError::UartInitFailed));
        }
    }
    info!("serial(espidf): UART{} up at {} baud", UART_PORT, BAUD_RATE);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start() -> crate::Result<()> {
    info!("serial(sim): console at {} baud (no hardware)", BAUD_RATE);
    Ok(())
}

/// Drain pending UART bytes into the command channel. Non-blocking; called
/// every control-loop tick.
#[cfg(target_os = "espidf")]
pub fn poll(assembler: &mut LineAssembler) {
    use esp_idf_svc::sys::*;

    let mut byte = 0u8;
    loop {
        // SAFETY: driver installed in start(); zero timeout never blocks.
        let n = unsafe { uart_read_bytes(UART_PORT as i32, (&mut byte as *mut u8).cast(), 1, 0) };
        if n <= 0 {
            break;
        }
        if let Some(line) = assembler.push_byte(byte) {
            channels::try_push_line(Source::Serial, line.as_str());
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn poll(_assembler: &mut LineAssembler) {}

// ───────────────────────────────────────────────────────────────
// Outbound sink
// ───────────────────────────────────────────────────────────────

/// [`LineSink`] that writes lines to the wired console, LF-terminated.
pub struct SerialSink;

impl SerialSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SerialSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSink for SerialSink {
    #[cfg(target_os = "espidf")]
    fn send_line(&mut self, line: &str) {
        use esp_idf_svc::sys::*;
        // SAFETY: driver installed in start(); TX queue of 0 means the call
        // copies into the FIFO and returns.
        unsafe {
            uart_write_bytes(UART_PORT as i32, line.as_ptr().cast(), line.len());
            uart_write_bytes(UART_PORT as i32, b"\n".as_ptr().cast(), 1);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn send_line(&mut self, line: &str) {
        println!("{line}");
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
