//! One-shot hardware peripheral initialization.
//!
//! Configures the LEDC timer/channel for the ESC signal line and the GPIO
//! direction for the indicator LED using raw ESP-IDF sys calls. Called once
//! from `main()` before the control loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed => write!(f, "LEDC timer/channel config failed"),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::LED_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as output during init_gpio_outputs().
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC (servo-style ESC pulse) ──────────────────────────────

#[cfg(target_os = "espidf")]
const LEDC_TIMER_ESC: u32 = ledc_timer_t_LEDC_TIMER_0;
#[cfg(target_os = "espidf")]
const LEDC_CH_ESC: u32 = ledc_channel_t_LEDC_CHANNEL_0;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer_cfg = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        duty_resolution: pins::ESC_PWM_RESOLUTION_BITS,
        timer_num: LEDC_TIMER_ESC,
        freq_hz: pins::ESC_PWM_FREQ_HZ,
        clk_cfg: ledc_clk_cfg_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    if unsafe { ledc_timer_config(&timer_cfg) } != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed);
    }

    let chan_cfg = ledc_channel_config_t {
        gpio_num: pins::ESC_SIGNAL_GPIO,
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_CH_ESC,
        intr_type: ledc_intr_type_t_LEDC_INTR_DISABLE,
        timer_sel: LEDC_TIMER_ESC,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    if unsafe { ledc_channel_config(&chan_cfg) } != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed);
    }

    info!(
        "hw_init: LEDC ch{} on GPIO{} at {} Hz / {}-bit",
        LEDC_CH_ESC,
        pins::ESC_SIGNAL_GPIO,
        pins::ESC_PWM_FREQ_HZ,
        pins::ESC_PWM_RESOLUTION_BITS
    );
    Ok(())
}

/// Convert a pulse width in µs to an LEDC duty count for the ESC timer.
pub fn pulse_us_to_duty(us: u16) -> u32 {
    let full_scale = 1u32 << pins::ESC_PWM_RESOLUTION_BITS;
    u32::from(us).min(pins::ESC_PWM_PERIOD_US) * full_scale / pins::ESC_PWM_PERIOD_US
}

#[cfg(target_os = "espidf")]
pub fn ledc_set_pulse_us(us: u16) {
    let duty = pulse_us_to_duty(us);
    // SAFETY: channel/timer configured during init_ledc(); main-loop only.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_CH_ESC, duty);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_CH_ESC);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set_pulse_us(_us: u16) {}
