//! Fetch orchestration: connect, locate, download, install.
//!
//! ```text
//!  WiFi (bounded retry) ─▶ SNTP ─▶ locator ─▶ forecast ─▶ window ─▶ save
//!        │                   │        │           │           │
//!        └── Offline         │   Fixed (IP fail)  │           └── No Data
//!                         No Time              HTTP Err / No Data
//! ```
//!
//! The sequence is the same for cold boot, scheduled refresh and manual
//! triggers.  It never returns an error: the snapshot always ends up
//! either freshly populated or explicitly marked failed, and it is
//! checkpointed through the store either way.

use core::time::Duration;

use heapless::Vec;
use log::{info, warn};

use super::events::{AppEvent, FetchOutcome};
use super::ports::{ConnectivityError, ForecastEntry, Ports};
use crate::config::{MAX_NETWORKS, NetworkCredential, SystemConfig};
use crate::error::FetchError;
use crate::model::{
    Coordinates, FORECAST_SLOTS, ForecastWindow, HourlyUv, LocationPreference, PersistedState,
    fit_label, format_hhmm, hour_of_day,
};

/// Location label when fixed coordinates were chosen.
pub const FIXED_LABEL: &str = "Fixed";
/// Location label when IP lookup failed and fixed coordinates were used.
pub const FIXED_FALLBACK_LABEL: &str = "Fixed (IP fail)";

pub struct FetchOrchestrator {
    networks: Vec<NetworkCredential, MAX_NETWORKS>,
    connect_timeout: Duration,
    sync_timeout: Duration,
    fixed_location: Coordinates,
}

impl FetchOrchestrator {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            networks: config.networks.clone(),
            connect_timeout: Duration::from_millis(u64::from(config.wifi_connect_timeout_ms)),
            sync_timeout: Duration::from_millis(u64::from(config.time_sync_timeout_ms)),
            fixed_location: config.fixed_location,
        }
    }

    /// Run the whole sequence against `state`.  `silent` only suppresses
    /// progress screens; retries and timeouts are unchanged.
    pub fn run_fetch_sequence(
        &self,
        state: &mut PersistedState,
        io: &mut Ports<'_>,
        silent: bool,
    ) -> FetchOutcome {
        let outcome = match self.try_fetch(state, io, silent) {
            Ok(slots) => FetchOutcome::Updated { slots },
            Err(e) => {
                warn!("Fetch failed: {}", e);
                state.snapshot.mark_failed(e.status());
                FetchOutcome::Failed(e)
            }
        };

        if silent {
            io.net.disconnect();
        }

        if let Err(e) = io.store.save(state) {
            warn!("Post-fetch checkpoint failed: {}", e);
            io.sink.emit(&AppEvent::PersistFailed(e));
        }
        io.sink.emit(&AppEvent::FetchCompleted(outcome));
        outcome
    }

    fn try_fetch(
        &self,
        state: &mut PersistedState,
        io: &mut Ports<'_>,
        silent: bool,
    ) -> Result<usize, FetchError> {
        if !silent {
            io.presenter.show_status("Connecting WiFi...");
        }
        self.ensure_connected(io)?;

        if !io.clock.sync(self.sync_timeout) {
            warn!("Time sync did not complete within {:?}", self.sync_timeout);
        }

        if !silent {
            io.presenter.show_status("Locating...");
        }
        self.resolve_location(state, io);

        if !silent {
            io.presenter.show_status("Fetching UV...");
        }
        let forecast = io.forecast.fetch(state.snapshot.coordinates)?;
        state.utc_offset_secs = forecast.utc_offset_secs;

        let local_now = io
            .clock
            .utc_now()
            .map(|utc| state.local_time(utc))
            .ok_or(FetchError::ClockUnavailable)?;

        let window = select_window(&forecast.entries, hour_of_day(local_now))?;
        state
            .snapshot
            .apply_forecast(window, forecast.current_uv, &format_hhmm(local_now));
        let slots = state.snapshot.filled_slots();
        info!(
            "Forecast installed: {} slots from hour {:02}",
            slots,
            window[0].map_or(0, |h| h.hour())
        );
        Ok(slots)
    }

    /// Try every candidate network once, each bounded by the connect timeout.
    fn ensure_connected(&self, io: &mut Ports<'_>) -> Result<(), FetchError> {
        if io.net.is_connected() {
            return Ok(());
        }
        let mut last = ConnectivityError::NoCredentials;
        for cred in &self.networks {
            match io.net.connect(cred, self.connect_timeout) {
                Ok(()) => {
                    info!("WiFi associated with '{}'", cred.ssid);
                    return Ok(());
                }
                Err(e) => {
                    warn!("WiFi '{}' failed: {}", cred.ssid, e);
                    last = e;
                }
            }
        }
        Err(FetchError::NoNetwork(last))
    }

    /// Pick coordinates per the location preference.  Never fails: a
    /// locator failure falls back to the fixed coordinates.
    fn resolve_location(&self, state: &mut PersistedState, io: &mut Ports<'_>) {
        let snap = &mut state.snapshot;
        match state.location_preference {
            LocationPreference::FixedCoordinates => {
                snap.coordinates = self.fixed_location;
                snap.location_label = fit_label(FIXED_LABEL);
            }
            LocationPreference::IpLocation => match io.locator.locate() {
                Ok(loc) if loc.coordinates.is_plausible() => {
                    snap.coordinates = loc.coordinates;
                    snap.location_label = fit_label(&loc.city);
                }
                Ok(loc) => {
                    warn!("Locator returned implausible {:?}", loc.coordinates);
                    snap.coordinates = self.fixed_location;
                    snap.location_label = fit_label(FIXED_FALLBACK_LABEL);
                }
                Err(e) => {
                    warn!("Locator failed ({}), using fixed coordinates", e);
                    snap.coordinates = self.fixed_location;
                    snap.location_label = fit_label(FIXED_FALLBACK_LABEL);
                }
            },
        }
    }
}

/// Copy up to [`FORECAST_SLOTS`] consecutive entries starting at the first
/// one whose hour is at or after `local_hour`.  Trailing slots stay unset.
pub fn select_window(entries: &[ForecastEntry], local_hour: u8) -> Result<ForecastWindow, FetchError> {
    let start = entries
        .iter()
        .position(|e| e.hour >= local_hour)
        .ok_or(FetchError::NoMatchingHour)?;

    let mut window = [None; FORECAST_SLOTS];
    for (slot, e) in window.iter_mut().zip(&entries[start..]) {
        *slot = Some(HourlyUv::new(e.hour, e.uv_index));
    }
    Ok(window)
}
