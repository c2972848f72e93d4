//! Transport → control-loop command hand-off.
//!
//! The wired channel is polled inside the loop, but BLE GATT writes arrive on
//! the radio stack's own task at any time relative to the loop. Letting that
//! callback touch control state directly would be a data race, so each
//! transport only *enqueues* raw lines here and the control loop — the sole
//! consumer and sole mutator of state — drains them during its own tick.
//!
//! ```text
//! ┌──────────────┐              ┌───────────────┐
//! │ UART poll    │── LineMsg ──▶│               │
//! │ BLE callback │── LineMsg ──▶│  Control loop │
//! └──────────────┘  (bounded)   └───────────────┘
//! ```
//!
//! Uses an `embassy-sync` bounded channel with no heap allocation on the
//! producer side; a full queue drops the line rather than blocking the
//! radio task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use log::warn;

/// Maximum accepted command-line length (bytes). Longer lines are truncated
/// at the transport edge before they reach the parser.
pub const LINE_CAP: usize = 64;

/// Queue depth. Sized for a worst-case burst of button events in one tick.
const LINE_DEPTH: usize = 8;

/// Which transport a line arrived on; replies and diagnostics go back to the
/// same peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Serial,
    Ble,
}

/// One raw command line, as delivered by a transport.
pub struct LineMsg {
    pub source: Source,
    pub line: String<LINE_CAP>,
}

/// Inbound command-line channel: transports → control loop.
pub static LINE_CHANNEL: Channel<CriticalSectionRawMutex, LineMsg, LINE_DEPTH> = Channel::new();

/// Enqueue a line from a transport. Safe to call from the BLE callback
/// context: non-blocking, no allocation. Returns `false` if the queue was
/// full and the line was dropped.
pub fn try_push_line(source: Source, raw: &str) -> bool {
    let mut line: String<LINE_CAP> = String::new();
    // Truncate oversized lines instead of rejecting them; a clipped command
    // parses as unknown and gets a diagnostic, which beats silence.
    for ch in raw.chars() {
        if line.push(ch).is_err() {
            break;
        }
    }

    match LINE_CHANNEL.try_send(LineMsg { source, line }) {
        Ok(()) => true,
        Err(_) => {
            warn!("command channel full — dropped line from {source:?}");
            false
        }
    }
}
