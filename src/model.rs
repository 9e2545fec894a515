//! Domain data model: the forecast snapshot and the state that must
//! survive deep sleep.
//!
//! Everything here is plain data with invariants enforced at
//! construction time:
//!
//! - a forecast window always has exactly [`FORECAST_SLOTS`] entries;
//! - an entry is either fully set ([`HourlyUv`]) or fully unset (`None`);
//! - UV values are never negative.

use core::fmt::Write;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

/// Number of hourly bars on the dashboard.
pub const FORECAST_SLOTS: usize = 6;

/// UV value that maps to a full-height bar.
pub const UV_GRAPH_CAP: f32 = 15.0;

/// Capacity of the "last update" label ("14:30", "Offline", ...).
pub const UPDATE_LABEL_LEN: usize = 12;
/// Capacity of the location label.
pub const LOCATION_LABEL_LEN: usize = 20;
/// Capacity of the network label shown in the overlay.
pub const NETWORK_LABEL_LEN: usize = 15;

/// Fixed-length forecast window.
pub type ForecastWindow = [Option<HourlyUv>; FORECAST_SLOTS];

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f32,
    pub longitude: f32,
}

impl Coordinates {
    pub fn is_plausible(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Hourly entry
// ---------------------------------------------------------------------------

/// One populated forecast slot.
///
/// Fields are private so every instance goes through [`HourlyUv::new`],
/// which clamps the UV value; deserialisation goes through the same path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(u8, f32)", into = "(u8, f32)")]
pub struct HourlyUv {
    hour: u8,
    uv_index: f32,
}

impl HourlyUv {
    /// `hour` wraps into 0–23; negative or non-finite UV becomes 0.
    pub fn new(hour: u8, uv_index: f32) -> Self {
        Self {
            hour: hour % 24,
            uv_index: sanitize_uv(uv_index),
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn uv_index(&self) -> f32 {
        self.uv_index
    }

    pub fn band(&self) -> UvBand {
        UvBand::classify(self.uv_index)
    }
}

impl From<(u8, f32)> for HourlyUv {
    fn from((hour, uv): (u8, f32)) -> Self {
        Self::new(hour, uv)
    }
}

impl From<HourlyUv> for (u8, f32) {
    fn from(h: HourlyUv) -> Self {
        (h.hour, h.uv_index)
    }
}

/// Clamp a provider UV value into the non-negative range.
pub fn sanitize_uv(uv: f32) -> f32 {
    if uv.is_finite() && uv > 0.0 { uv } else { 0.0 }
}

// ---------------------------------------------------------------------------
// UV severity
// ---------------------------------------------------------------------------

/// WHO exposure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvBand {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvBand {
    pub fn classify(uv: f32) -> Self {
        match uv {
            u if u < 3.0 => Self::Low,
            u if u < 6.0 => Self::Moderate,
            u if u < 8.0 => Self::High,
            u if u < 11.0 => Self::VeryHigh,
            _ => Self::Extreme,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::Extreme => "Extreme",
        }
    }
}

// ---------------------------------------------------------------------------
// Preferences and mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocationPreference {
    FixedCoordinates,
    #[default]
    IpLocation,
}

impl LocationPreference {
    pub fn toggled(self) -> Self {
        match self {
            Self::FixedCoordinates => Self::IpLocation,
            Self::IpLocation => Self::FixedCoordinates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerMode {
    #[default]
    Normal,
    LowPower,
}

impl PowerMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::LowPower,
            Self::LowPower => Self::Normal,
        }
    }

    /// Encoding used in the durable byte.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::LowPower => 1,
        }
    }

    /// `None` for any byte other than 0 or 1 (erased or corrupt).
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Normal),
            1 => Some(Self::LowPower),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch status
// ---------------------------------------------------------------------------

/// Outcome of the most recent refresh, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FetchStatus {
    #[default]
    NeverFetched,
    Fresh,
    Offline,
    HttpError,
    NoData,
    NoTime,
}

impl FetchStatus {
    /// Label shown in place of the update time when the refresh failed.
    pub fn label(self) -> &'static str {
        match self {
            Self::NeverFetched => "--:--",
            Self::Fresh => "",
            Self::Offline => "Offline",
            Self::HttpError => "HTTP Err",
            Self::NoData => "No Data",
            Self::NoTime => "No Time",
        }
    }
}

// ---------------------------------------------------------------------------
// Forecast snapshot
// ---------------------------------------------------------------------------

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    hourly: ForecastWindow,
    current_uv: Option<f32>,
    pub last_update_label: String<UPDATE_LABEL_LEN>,
    pub location_label: String<LOCATION_LABEL_LEN>,
    pub coordinates: Coordinates,
    is_valid: bool,
    status: FetchStatus,
}

impl ForecastSnapshot {
    pub fn empty(coordinates: Coordinates) -> Self {
        Self {
            hourly: [None; FORECAST_SLOTS],
            current_uv: None,
            last_update_label: fit_label(FetchStatus::NeverFetched.label()),
            location_label: String::new(),
            coordinates,
            is_valid: false,
            status: FetchStatus::NeverFetched,
        }
    }

    pub fn hourly(&self) -> &ForecastWindow {
        &self.hourly
    }

    pub fn current_uv(&self) -> Option<f32> {
        self.current_uv
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    /// Number of populated slots.
    pub fn filled_slots(&self) -> usize {
        self.hourly.iter().filter(|s| s.is_some()).count()
    }

    /// Install a freshly parsed window and stamp it with `updated_at`.
    pub fn apply_forecast(
        &mut self,
        hourly: ForecastWindow,
        current_uv: Option<f32>,
        updated_at: &str,
    ) {
        self.hourly = hourly;
        self.current_uv = current_uv.map(sanitize_uv);
        self.last_update_label = fit_label(updated_at);
        self.is_valid = true;
        self.status = FetchStatus::Fresh;
    }

    /// Drop every numeric value and label the failure.
    pub fn mark_failed(&mut self, status: FetchStatus) {
        self.hourly = [None; FORECAST_SLOTS];
        self.current_uv = None;
        self.last_update_label = fit_label(status.label());
        self.is_valid = false;
        self.status = status;
    }
}

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

/// State that outlives a deep-sleep cycle.
///
/// The whole struct lives in retention memory; `mode` is additionally
/// mirrored to the durable byte so it survives a full power cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub snapshot: ForecastSnapshot,
    pub location_preference: LocationPreference,
    pub mode: PowerMode,
    /// Offset from UTC to local wall-clock time, as last reported by the
    /// forecast provider.
    pub utc_offset_secs: i32,
}

impl PersistedState {
    /// First-boot defaults: Normal mode, IP location, empty forecast.
    pub fn initial(config: &SystemConfig) -> Self {
        Self {
            snapshot: ForecastSnapshot::empty(config.fixed_location),
            location_preference: LocationPreference::default(),
            mode: PowerMode::default(),
            utc_offset_secs: config.default_utc_offset_secs,
        }
    }

    pub fn low_power_active(&self) -> bool {
        self.mode == PowerMode::LowPower
    }

    /// Local wall-clock seconds for a UTC epoch.
    pub fn local_time(&self, utc_secs: i64) -> i64 {
        utc_secs + i64::from(self.utc_offset_secs)
    }
}

// ---------------------------------------------------------------------------
// Label helpers
// ---------------------------------------------------------------------------

/// Copy `s` into a fixed-capacity string, replacing the tail with `...`
/// when it does not fit.  Truncation respects char boundaries.
pub fn fit_label<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    if s.len() <= N {
        let _ = out.push_str(s);
        return out;
    }
    let budget = N.saturating_sub(3);
    for c in s.chars() {
        if out.len() + c.len_utf8() > budget {
            break;
        }
        let _ = out.push(c);
    }
    let _ = out.push_str(&"..."[..N.min(3)]);
    out
}

/// `HH:MM` for a local wall-clock epoch.
pub fn format_hhmm(local_secs: i64) -> String<UPDATE_LABEL_LEN> {
    let day_secs = local_secs.rem_euclid(86_400);
    let mut out = String::new();
    let _ = write!(out, "{:02}:{:02}", day_secs / 3600, (day_secs % 3600) / 60);
    out
}

/// Hour of day (0–23) for a local wall-clock epoch.
pub fn hour_of_day(local_secs: i64) -> u8 {
    (local_secs.rem_euclid(86_400) / 3600) as u8
}
