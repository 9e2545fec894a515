//! Clock adapter.
//!
//! Implements [`ClockPort`]: monotonic uptime, wall-clock UTC and SNTP
//! synchronisation.
//!
//! - **`target_os = "espidf"`**: uptime from `esp_timer_get_time()`,
//!   wall clock from `gettimeofday()` (the RTC keeps it across deep
//!   sleep), sync through `EspSntp`.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` for uptime and
//!   a settable UTC value for host-side simulation.

use core::time::Duration;

use log::{info, warn};

use crate::app::ports::ClockPort;

/// Anything before 2020-01-01 means the clock was never set.
const EPOCH_2020: i64 = 1_577_836_800;

pub struct SystemClock {
    #[cfg(target_os = "espidf")]
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    /// Simulation: UTC seconds at `start`, `None` until "synced".
    #[cfg(not(target_os = "espidf"))]
    utc_at_start: Option<i64>,
    /// Simulation: value installed by a successful `sync()`.
    #[cfg(not(target_os = "espidf"))]
    sync_source: Option<i64>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            sntp: None,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            utc_at_start: None,
            #[cfg(not(target_os = "espidf"))]
            sync_source: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .ok()
                .map(|d| d.as_secs() as i64),
        }
    }

    /// Simulation: a clock that is already set to `utc` and whose SNTP
    /// source reports `sync_to` (or nothing).
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated(utc: Option<i64>, sync_to: Option<i64>) -> Self {
        Self {
            start: std::time::Instant::now(),
            utc_at_start: utc,
            sync_source: sync_to,
        }
    }
}

impl ClockPort for SystemClock {
    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        // SAFETY: read of the free-running high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[cfg(target_os = "espidf")]
    fn utc_now(&self) -> Option<i64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: gettimeofday writes into the local timeval only.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        let secs = tv.tv_sec as i64;
        (secs >= EPOCH_2020).then_some(secs)
    }

    #[cfg(not(target_os = "espidf"))]
    fn utc_now(&self) -> Option<i64> {
        self.utc_at_start
            .map(|base| base + self.start.elapsed().as_secs() as i64)
            .filter(|&t| t >= EPOCH_2020)
    }

    #[cfg(target_os = "espidf")]
    fn sync(&mut self, timeout: Duration) -> bool {
        use esp_idf_svc::sntp::{EspSntp, SyncStatus};

        if self.sntp.is_none() {
            match EspSntp::new_default() {
                Ok(s) => self.sntp = Some(s),
                Err(e) => {
                    warn!("SNTP: start failed ({})", e);
                    return self.utc_now().is_some();
                }
            }
        }
        let Some(sntp) = self.sntp.as_ref() else {
            return self.utc_now().is_some();
        };

        let deadline = std::time::Instant::now() + timeout;
        while sntp.get_sync_status() != SyncStatus::Completed {
            if std::time::Instant::now() >= deadline {
                warn!("SNTP: not synchronised after {:?}", timeout);
                return self.utc_now().is_some();
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        info!("SNTP: synchronised, utc={:?}", self.utc_now());
        true
    }

    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    #[cfg(not(target_os = "espidf"))]
    fn sync(&mut self, _timeout: Duration) -> bool {
        match self.sync_source {
            Some(utc) => {
                self.utc_at_start = Some(utc - self.start.elapsed().as_secs() as i64);
                info!("SNTP(sim): synchronised to {}", utc);
                true
            }
            None => {
                warn!("SNTP(sim): no time source");
                self.utc_now().is_some()
            }
        }
    }
}
