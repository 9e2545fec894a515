//! IP geolocation via ip-api.com.
//!
//! Implements [`LocatorPort`].  The request carries no parameters; the
//! service locates the caller's public address.
//!
//! ```text
//! GET http://ip-api.com/json/?fields=status,lat,lon,city
//! {"status":"success","city":"Dubai","lat":25.2697,"lon":55.3095}
//! ```

use serde::Deserialize;

use super::http::HttpClient;
use crate::app::ports::{Location, LocatorPort};
use crate::error::FetchError;
use crate::model::Coordinates;

pub const LOCATOR_URL: &str = "http://ip-api.com/json/?fields=status,lat,lon,city";

#[derive(Deserialize)]
struct LocatorReply {
    status: Option<String>,
    lat: Option<f32>,
    lon: Option<f32>,
    city: Option<String>,
}

/// Parse a locator body.  Anything but `"status":"success"` with both
/// coordinates present is a failure.
pub fn parse_location(body: &str) -> Result<Location, FetchError> {
    let reply: LocatorReply =
        serde_json::from_str(body).map_err(|_| FetchError::Malformed("locator JSON"))?;

    if reply.status.as_deref() != Some("success") {
        return Err(FetchError::Malformed("locator status not success"));
    }
    let latitude = reply.lat.ok_or(FetchError::MissingField("lat"))?;
    let longitude = reply.lon.ok_or(FetchError::MissingField("lon"))?;

    Ok(Location {
        coordinates: Coordinates {
            latitude,
            longitude,
        },
        city: reply
            .city
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "IP location".to_owned()),
    })
}

pub struct IpLocator<H> {
    http: H,
}

impl<H: HttpClient> IpLocator<H> {
    pub fn new(http: H) -> Self {
        Self { http }
    }
}

impl<H: HttpClient> LocatorPort for IpLocator<H> {
    fn locate(&mut self) -> Result<Location, FetchError> {
        let body = self.http.get(LOCATOR_URL)?;
        parse_location(&body)
    }
}
