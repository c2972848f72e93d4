//! ESC signal driver.
//!
//! Emits a servo-style pulse on the ESC signal line via LEDC. The external
//! speed controller turns the pulse width into motor power; this driver only
//! reproduces whatever width it is handed.
//!
//! ## Safety contract
//!
//! All pulses arriving here have already passed the forward-only clamp in
//! the service. This driver is a dumb actuator and performs no policy of
//! its own.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real LEDC channel via hw_init helpers.
//! On host/test: tracks the commanded width in-memory only.

use crate::drivers::hw_init;

pub struct EscDriver {
    current_us: u16,
}

impl EscDriver {
    /// Create the driver and command the given initial pulse (normally the
    /// neutral width, so the ESC sees a valid signal from the first frame).
    pub fn new(initial_us: u16) -> Self {
        hw_init::ledc_set_pulse_us(initial_us);
        Self {
            current_us: initial_us,
        }
    }

    pub fn set_pulse_us(&mut self, us: u16) {
        if us != self.current_us {
            hw_init::ledc_set_pulse_us(us);
            self.current_us = us;
        }
    }

    pub fn current_us(&self) -> u16 {
        self.current_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_last_commanded_width() {
        let mut esc = EscDriver::new(1100);
        assert_eq!(esc.current_us(), 1100);
        esc.set_pulse_us(1500);
        assert_eq!(esc.current_us(), 1500);
        esc.set_pulse_us(1500); // redundant write is a no-op
        assert_eq!(esc.current_us(), 1500);
    }
}
