//! One-shot GPIO initialization.
//!
//! Configures the backlight output using raw ESP-IDF sys calls and
//! releases the pad hold left over from deep sleep.  The buttons are
//! owned by `PinDriver`s in `main()`.  Called once before the loop
//! starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the loop; single-threaded.
    unsafe { init_backlight()? };
    info!("hw_init: backlight GPIO{} configured", pins::BACKLIGHT_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_backlight() -> Result<(), HwInitError> {
    // The pad may still be held from the last deep sleep.
    unsafe { gpio_hold_dis(pins::BACKLIGHT_GPIO) };
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BACKLIGHT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    unsafe { gpio_set_level(pins::BACKLIGHT_GPIO, 0) };
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    let level = u32::from(high);
    // SAFETY: register write on an output configured in init_backlight().
    unsafe {
        gpio_set_level(pin, level);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

/// Latch an output pad so it keeps its level through deep sleep.
#[cfg(target_os = "espidf")]
pub fn gpio_hold(pin: i32) {
    // SAFETY: pad hold only freezes the current level.
    unsafe { gpio_hold_en(pin) };
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_hold(_pin: i32) {}
