//! Hardware adapter — [`ActuatorPort`] over the real drivers.

use crate::app::ports::ActuatorPort;
use crate::drivers::esc::EscDriver;
use crate::drivers::status_led::StatusLed;

/// Bundles the physical outputs behind the actuator port.
pub struct HardwareAdapter {
    esc: EscDriver,
    led: StatusLed,
}

impl HardwareAdapter {
    /// `neutral_us` is issued immediately so the ESC sees a valid signal
    /// from the first PWM frame.
    pub fn new(neutral_us: u16) -> Self {
        Self {
            esc: EscDriver::new(neutral_us),
            led: StatusLed::new(),
        }
    }

    pub fn current_pulse_us(&self) -> u16 {
        self.esc.current_us()
    }
}

impl ActuatorPort for HardwareAdapter {
    fn set_pulse_us(&mut self, us: u16) {
        self.esc.set_pulse_us(us);
    }

    fn set_led(&mut self, on: bool) {
        self.led.set(on);
    }
}
