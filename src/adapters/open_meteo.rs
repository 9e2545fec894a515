//! Open-Meteo forecast provider.
//!
//! Implements [`ForecastPort`] on top of an [`HttpClient`].  The request
//! asks for the current UV index plus one day of hourly values in the
//! location's own time zone:
//!
//! ```text
//! GET https://api.open-meteo.com/v1/forecast?latitude=25.2697&longitude=55.3095
//!     &current=uv_index&hourly=uv_index&forecast_days=1&timezone=auto
//! ```

use core::fmt::Write as _;

use chrono::{NaiveDateTime, Timelike};
use serde::Deserialize;

use super::http::HttpClient;
use crate::app::ports::{ForecastEntry, ForecastPort, HourlyForecast};
use crate::error::FetchError;
use crate::model::{Coordinates, sanitize_uv};

const BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

// ── JSON structures ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct ForecastRoot {
    utc_offset_seconds: Option<i32>,
    current: Option<CurrentBlock>,
    hourly: Option<HourlyBlock>,
}

#[derive(Deserialize)]
struct CurrentBlock {
    uv_index: Option<f32>,
}

#[derive(Deserialize)]
struct HourlyBlock {
    time: Option<Vec<String>>,
    uv_index: Option<Vec<Option<f32>>>,
}

// ── Request / parse ─────────────────────────────────────────────────

/// Forecast URL for `at`, coordinates printed to four decimals.
pub fn forecast_url(at: Coordinates) -> String {
    let mut url = String::with_capacity(160);
    let _ = write!(
        url,
        "{}?latitude={:.4}&longitude={:.4}&current=uv_index&hourly=uv_index&forecast_days=1&timezone=auto",
        BASE_URL, at.latitude, at.longitude
    );
    url
}

/// Parse a forecast body.  Null hourly UV reads as 0; a missing current
/// value is tolerated; anything else missing is a data error.
pub fn parse_forecast(body: &str) -> Result<HourlyForecast, FetchError> {
    let root: ForecastRoot =
        serde_json::from_str(body).map_err(|_| FetchError::Malformed("forecast JSON"))?;

    let utc_offset_secs = root
        .utc_offset_seconds
        .ok_or(FetchError::MissingField("utc_offset_seconds"))?;
    let hourly = root.hourly.ok_or(FetchError::MissingField("hourly"))?;
    let times = hourly.time.ok_or(FetchError::MissingField("hourly.time"))?;
    let values = hourly
        .uv_index
        .ok_or(FetchError::MissingField("hourly.uv_index"))?;

    if times.is_empty() {
        return Err(FetchError::Malformed("hourly series empty"));
    }
    if times.len() != values.len() {
        return Err(FetchError::Malformed("hourly series length mismatch"));
    }

    let entries = times
        .iter()
        .zip(values)
        .map(|(t, uv)| {
            let stamp = NaiveDateTime::parse_from_str(t, TIME_FORMAT)
                .map_err(|_| FetchError::Malformed("hourly timestamp"))?;
            Ok(ForecastEntry {
                hour: stamp.hour() as u8,
                uv_index: sanitize_uv(uv.unwrap_or(0.0)),
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    Ok(HourlyForecast {
        utc_offset_secs,
        current_uv: root.current.and_then(|c| c.uv_index).map(sanitize_uv),
        entries,
    })
}

// ── Adapter ─────────────────────────────────────────────────────────

pub struct OpenMeteoProvider<H> {
    http: H,
}

impl<H: HttpClient> OpenMeteoProvider<H> {
    pub fn new(http: H) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &H {
        &self.http
    }
}

impl<H: HttpClient> ForecastPort for OpenMeteoProvider<H> {
    fn fetch(&mut self, at: Coordinates) -> Result<HourlyForecast, FetchError> {
        let body = self.http.get(&forecast_url(at))?;
        parse_forecast(&body)
    }
}
