//! Power and display hardware adapter.
//!
//! Implements [`PowerPort`]: wake-cause query, backlight switching and
//! deep sleep entry.  On non-espidf targets it records every call so the
//! host loop and tests can observe what the device would have done.

use core::time::Duration;

use log::info;

use crate::app::ports::{PowerPort, WakeCause};
use crate::drivers::hw_init;
use crate::pins;

pub struct HardwareAdapter {
    backlight: bool,
    #[cfg(not(target_os = "espidf"))]
    simulated_wake: WakeCause,
    /// Simulation: every requested sleep, oldest first.
    #[cfg(not(target_os = "espidf"))]
    sleeps: std::vec::Vec<Duration>,
}

impl HardwareAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self { backlight: false }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self::simulated(WakeCause::ColdBoot)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn simulated(wake: WakeCause) -> Self {
        Self {
            backlight: false,
            simulated_wake: wake,
            sleeps: std::vec::Vec::new(),
        }
    }

    pub fn backlight(&self) -> bool {
        self.backlight
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerPort for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn wake_cause(&self) -> WakeCause {
        use esp_idf_svc::sys::*;

        // SAFETY: read-only query of the sleep controller.
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        #[allow(non_upper_case_globals)]
        match cause {
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::Timer,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0 => WakeCause::Button,
            _ => WakeCause::ColdBoot,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn wake_cause(&self) -> WakeCause {
        self.simulated_wake
    }

    fn set_display_power(&mut self, on: bool) {
        hw_init::gpio_write(pins::BACKLIGHT_GPIO, on);
        self.backlight = on;
        info!("Display: backlight {}", if on { "on" } else { "off" });
    }

    #[cfg(target_os = "espidf")]
    fn enter_deep_sleep(&mut self, duration: Duration) {
        use esp_idf_svc::sys::*;

        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        info!("Power: deep sleep for {}s", duration.as_secs());
        hw_init::gpio_write(pins::BACKLIGHT_GPIO, false);
        hw_init::gpio_hold(pins::BACKLIGHT_GPIO);
        // SAFETY: wake sources are armed from the single main task right
        // before esp_deep_sleep_start, which does not return.
        unsafe {
            esp_sleep_enable_timer_wakeup(micros);
            esp_sleep_enable_ext0_wakeup(pins::BUTTON_B_GPIO, pins::WAKE_LEVEL);
            esp_deep_sleep_start();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn enter_deep_sleep(&mut self, duration: Duration) {
        info!("Power(sim): deep sleep for {}s", duration.as_secs());
        self.backlight = false;
        self.sleeps.push(duration);
    }
}
