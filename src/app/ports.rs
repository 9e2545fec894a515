//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PowerController / FetchOrchestrator (domain)
//! ```
//!
//! Driven adapters (network, forecast provider, locator, clock, storage,
//! display, power) implement these traits.  The domain core consumes them
//! through [`Ports`], so it never touches hardware directly.
//!
//! ## Contract notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **RetentionStore** survives deep sleep but not power loss;
//!   **DurableStore** survives both.  Neither promises atomicity beyond
//!   what the hardware gives; torn writes are detected one layer up.
//! - Every blocking port method takes or owns an explicit timeout.

use core::fmt;
use core::time::Duration;

use crate::config::{NetworkCredential, SystemConfig};
use crate::model::{
    Coordinates, ForecastSnapshot, LocationPreference, PersistedState, PowerMode,
};

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage tiers (driven adapters: domain ↔ RTC memory / NVS)
// ───────────────────────────────────────────────────────────────

/// Memory that keeps its contents across deep sleep but not power loss.
pub trait RetentionStore {
    /// Size of the retained region in bytes.
    fn capacity(&self) -> usize;

    /// Copy the region into `buf`; returns the number of bytes copied.
    fn load(&self, buf: &mut [u8]) -> usize;

    /// Overwrite `data.len()` bytes starting at `offset`.
    fn save(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;
}

/// A single byte that survives a full power cycle.
pub trait DurableStore {
    /// `Ok(None)` when the byte has never been written.
    fn load_byte(&self) -> Result<Option<u8>, StorageError>;

    fn save_byte(&mut self, value: u8) -> Result<(), StorageError>;
}

/// Checkpoint sink for [`PersistedState`].
///
/// Implemented by [`PersistentStore`](crate::persist::PersistentStore);
/// the controller only ever saves; loading happens once at boot.
pub trait StatePort {
    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain → WiFi station)
// ───────────────────────────────────────────────────────────────

pub trait ConnectivityPort {
    /// Join `credential`, blocking for at most `timeout`.
    fn connect(
        &mut self,
        credential: &NetworkCredential,
        timeout: Duration,
    ) -> Result<(), ConnectivityError>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// SSID of the current association, if any.
    fn ssid(&self) -> Option<&str>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain → RTC / SNTP)
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Monotonic milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    /// Seconds since the Unix epoch, or `None` if the clock was never set.
    fn utc_now(&self) -> Option<i64>;

    /// Synchronise the wall clock over the network, waiting at most
    /// `timeout`.  Returns whether the clock is now valid.
    fn sync(&mut self, timeout: Duration) -> bool;

    /// Block the calling task for `duration`.
    fn delay(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Forecast provider / locator (driven adapters: domain → HTTP APIs)
// ───────────────────────────────────────────────────────────────

/// One hourly forecast point, UV already null-to-zero and clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastEntry {
    /// Local hour of day (0–23).
    pub hour: u8,
    pub uv_index: f32,
}

/// A parsed forecast response.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
    pub utc_offset_secs: i32,
    pub current_uv: Option<f32>,
    pub entries: Vec<ForecastEntry>,
}

pub trait ForecastPort {
    fn fetch(&mut self, at: Coordinates) -> Result<HourlyForecast, crate::error::FetchError>;
}

/// A successful IP geolocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub coordinates: Coordinates,
    pub city: String,
}

pub trait LocatorPort {
    fn locate(&mut self) -> Result<Location, crate::error::FetchError>;
}

// ───────────────────────────────────────────────────────────────
// Presenter port (driven adapter: domain → display)
// ───────────────────────────────────────────────────────────────

/// Read-only view handed to the presenter on every redraw.
#[derive(Debug, Clone, Copy)]
pub struct DashboardView<'a> {
    pub snapshot: &'a ForecastSnapshot,
    pub mode: PowerMode,
    pub location_preference: LocationPreference,
    pub overlay_visible: bool,
    pub network: Option<&'a str>,
}

/// Short full-screen messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LowPowerEnabled,
    NormalEnabled,
    Resuming,
    LocationSource(LocationPreference),
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Self::LowPowerEnabled => "Low power mode ON",
            Self::NormalEnabled => "Low power mode OFF",
            Self::Resuming => "Resuming low power...",
            Self::LocationSource(LocationPreference::IpLocation) => "Location: IP lookup",
            Self::LocationSource(LocationPreference::FixedCoordinates) => "Location: fixed",
        }
    }
}

pub trait Presenter {
    fn render(&mut self, view: &DashboardView<'_>);

    /// Progress line during a non-silent fetch.
    fn show_status(&mut self, line: &str);

    fn show_notice(&mut self, notice: Notice);
}

// ───────────────────────────────────────────────────────────────
// Power port (driven adapter: domain → sleep controller, backlight)
// ───────────────────────────────────────────────────────────────

/// Why the CPU is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    ColdBoot,
    Timer,
    Button,
}

pub trait PowerPort {
    fn wake_cause(&self) -> WakeCause;

    fn set_display_power(&mut self, on: bool);

    /// Arm the timer and the button wake source, then deep-sleep.
    /// Does not return on hardware.
    fn enter_deep_sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Every driven port the controller needs for one call.
pub struct Ports<'a> {
    pub store: &'a mut dyn StatePort,
    pub net: &'a mut dyn ConnectivityPort,
    pub locator: &'a mut dyn LocatorPort,
    pub forecast: &'a mut dyn ForecastPort,
    pub clock: &'a mut dyn ClockPort,
    pub presenter: &'a mut dyn Presenter,
    pub power: &'a mut dyn PowerPort,
    pub sink: &'a mut dyn EventSink,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from storage tier operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Record does not fit the region.
    Full,
    /// Write outside the region.
    OutOfBounds,
    /// Generic I/O error (NVS open/set/commit failed).
    IoError,
    /// Encoding the record failed.
    Encode,
}

/// Errors from [`ConnectivityPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    Timeout,
    ConnectionFailed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "record larger than region"),
            Self::OutOfBounds => write!(f, "write outside region"),
            Self::IoError => write!(f, "I/O error"),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::Timeout => write!(f, "association timed out"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for StorageError {}
impl std::error::Error for ConnectivityError {}
