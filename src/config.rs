//! System configuration parameters
//!
//! All tunable parameters for the UV monitor.
//! Values can be overridden via NVS (non-volatile storage); anything not
//! stored falls back to [`SystemConfig::default`].

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::model::Coordinates;

/// Maximum number of candidate WiFi networks tried per fetch.
pub const MAX_NETWORKS: usize = 4;

/// One candidate access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCredential {
    pub ssid: String<32>,
    pub password: String<64>,
}

impl NetworkCredential {
    /// Build a credential, truncating nothing: returns `None` if either
    /// field exceeds the 802.11 length limits.
    pub fn new(ssid: &str, password: &str) -> Option<Self> {
        let mut s = String::new();
        let mut p = String::new();
        s.push_str(ssid).ok()?;
        p.push_str(password).ok()?;
        Some(Self {
            ssid: s,
            password: p,
        })
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Schedule ---
    /// Minute of the hour every slot grid is anchored to (0-59)
    pub anchor_minute: u8,
    /// Refresh slots per hour while always-on (1-60)
    pub normal_slots_per_hour: u8,
    /// Refresh slots per hour between deep sleeps (1-60)
    pub low_power_slots_per_hour: u8,
    /// A slot this close to "now" (either side) counts as due (seconds)
    pub due_tolerance_secs: u32,
    /// Sleep used when the wall clock is unknown (seconds)
    pub fallback_sleep_secs: u32,
    /// Interactive window after a button wake in low-power mode (seconds)
    pub awake_window_secs: u32,
    /// How long a mode notice stays lit before deep sleep (ms)
    pub notice_dwell_ms: u32,

    // --- Buttons ---
    /// Minimum stable duration before a level change is trusted (ms)
    pub debounce_ms: u32,
    /// Presses released before this count as short presses (ms)
    pub short_press_max_ms: u32,
    /// Holding this long fires a long press (ms)
    pub long_press_ms: u32,

    // --- Network ---
    /// Per-network association timeout (ms)
    pub wifi_connect_timeout_ms: u32,
    /// Per-request HTTP timeout (ms)
    pub http_timeout_ms: u32,
    /// SNTP synchronisation timeout after association (ms)
    pub time_sync_timeout_ms: u32,
    /// Candidate networks, tried in order
    pub networks: Vec<NetworkCredential, MAX_NETWORKS>,

    // --- Location ---
    /// Coordinates used when IP location is disabled or fails
    pub fixed_location: Coordinates,
    /// Offset applied to UTC before the first forecast reports one (seconds)
    pub default_utc_offset_secs: i32,

    // --- Timing ---
    /// Main loop poll interval (milliseconds)
    pub loop_interval_ms: u32,
    /// Task watchdog timeout (seconds)
    pub watchdog_timeout_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Schedule
            anchor_minute: 5,
            normal_slots_per_hour: 4, // :05, :20, :35, :50
            low_power_slots_per_hour: 1,
            due_tolerance_secs: 30,
            fallback_sleep_secs: 15 * 60,
            awake_window_secs: 30,
            notice_dwell_ms: 2_000,

            // Buttons
            debounce_ms: 60,
            short_press_max_ms: 1000,
            long_press_ms: 2000,

            // Network
            wifi_connect_timeout_ms: 15_000,
            http_timeout_ms: 10_000,
            time_sync_timeout_ms: 5_000,
            networks: build_time_networks(),

            // Location
            fixed_location: Coordinates {
                latitude: 25.2697,
                longitude: 55.3095,
            },
            default_utc_offset_secs: 0,

            // Timing
            loop_interval_ms: 20,
            watchdog_timeout_secs: 120,
        }
    }
}

/// Credentials baked in at build time via `UVMON_WIFI_SSID_n` /
/// `UVMON_WIFI_PASS_n`.  Unset or empty SSIDs are skipped.
fn build_time_networks() -> Vec<NetworkCredential, MAX_NETWORKS> {
    let candidates = [
        (option_env!("UVMON_WIFI_SSID_1"), option_env!("UVMON_WIFI_PASS_1")),
        (option_env!("UVMON_WIFI_SSID_2"), option_env!("UVMON_WIFI_PASS_2")),
    ];

    let mut out = Vec::new();
    for (ssid, pass) in candidates {
        let Some(ssid) = ssid.filter(|s| !s.is_empty()) else {
            continue;
        };
        if let Some(cred) = NetworkCredential::new(ssid, pass.unwrap_or("")) {
            let _ = out.push(cred);
        }
    }
    out
}

/// Range-check every field.  Invalid values are rejected, never clamped.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if cfg.anchor_minute > 59 {
        return Err(ConfigError::ValidationFailed("anchor_minute must be 0–59"));
    }
    if !(1..=60).contains(&cfg.normal_slots_per_hour) {
        return Err(ConfigError::ValidationFailed(
            "normal_slots_per_hour must be 1–60",
        ));
    }
    if !(1..=60).contains(&cfg.low_power_slots_per_hour) {
        return Err(ConfigError::ValidationFailed(
            "low_power_slots_per_hour must be 1–60",
        ));
    }
    if !(1..=300).contains(&cfg.due_tolerance_secs) {
        return Err(ConfigError::ValidationFailed(
            "due_tolerance_secs must be 1–300",
        ));
    }
    if !(60..=3 * 3600).contains(&cfg.fallback_sleep_secs) {
        return Err(ConfigError::ValidationFailed(
            "fallback_sleep_secs must be 60–10800",
        ));
    }
    if !(5..=600).contains(&cfg.awake_window_secs) {
        return Err(ConfigError::ValidationFailed(
            "awake_window_secs must be 5–600",
        ));
    }
    if cfg.notice_dwell_ms > 10_000 {
        return Err(ConfigError::ValidationFailed(
            "notice_dwell_ms must be 0–10000",
        ));
    }
    if !(10..=500).contains(&cfg.debounce_ms) {
        return Err(ConfigError::ValidationFailed("debounce_ms must be 10–500"));
    }
    if cfg.short_press_max_ms <= cfg.debounce_ms {
        return Err(ConfigError::ValidationFailed(
            "short_press_max_ms must exceed debounce_ms",
        ));
    }
    if cfg.long_press_ms < cfg.short_press_max_ms || cfg.long_press_ms > 10_000 {
        return Err(ConfigError::ValidationFailed(
            "long_press_ms must be short_press_max_ms–10000",
        ));
    }
    if !(1_000..=60_000).contains(&cfg.wifi_connect_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "wifi_connect_timeout_ms must be 1000–60000",
        ));
    }
    if !(1_000..=60_000).contains(&cfg.http_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "http_timeout_ms must be 1000–60000",
        ));
    }
    if cfg.time_sync_timeout_ms > 60_000 {
        return Err(ConfigError::ValidationFailed(
            "time_sync_timeout_ms must be 0–60000",
        ));
    }
    if !(-90.0..=90.0).contains(&cfg.fixed_location.latitude)
        || !(-180.0..=180.0).contains(&cfg.fixed_location.longitude)
    {
        return Err(ConfigError::ValidationFailed(
            "fixed_location out of range",
        ));
    }
    if !(-14 * 3600..=14 * 3600).contains(&cfg.default_utc_offset_secs) {
        return Err(ConfigError::ValidationFailed(
            "default_utc_offset_secs must be within ±14h",
        ));
    }
    if !(5..=1000).contains(&cfg.loop_interval_ms) || cfg.loop_interval_ms >= cfg.debounce_ms {
        return Err(ConfigError::ValidationFailed(
            "loop_interval_ms must be 5–1000 and below debounce_ms",
        ));
    }
    let worst_fetch_secs = (cfg.wifi_connect_timeout_ms as usize * cfg.networks.len().max(1)
        + 2 * cfg.http_timeout_ms as usize
        + cfg.time_sync_timeout_ms as usize)
        / 1000;
    if (cfg.watchdog_timeout_secs as usize) <= worst_fetch_secs {
        return Err(ConfigError::ValidationFailed(
            "watchdog_timeout_secs must exceed the worst-case fetch",
        ));
    }
    Ok(())
}
