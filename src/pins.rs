//! GPIO / peripheral pin assignments for the thrustbench carrier board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// ESC control signal
// ---------------------------------------------------------------------------

/// LEDC PWM output wired to the ESC signal line (white wire).
pub const ESC_SIGNAL_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Indicator LED
// ---------------------------------------------------------------------------

/// Digital output: bench indicator LED (active HIGH), toggled by `LED ON|OFF`.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// UART console (wired command channel)
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Servo-style ESC frame rate. 50 Hz gives a 20 000 µs period.
pub const ESC_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution (bits). 14-bit keeps ~1.2 µs of pulse granularity
/// at 50 Hz, comfortably below ESC dead-band.
pub const ESC_PWM_RESOLUTION_BITS: u32 = 14;
/// Period in microseconds, derived from the frame rate.
pub const ESC_PWM_PERIOD_US: u32 = 1_000_000 / ESC_PWM_FREQ_HZ;
