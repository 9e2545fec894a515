//! Blocking HTTP GET client.
//!
//! [`HttpClient`] is the seam between the JSON API adapters and the
//! transport, so the parsers are tested against canned bodies on the
//! host.
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` wrapped in the
//!   `embedded_svc` client, with the certificate bundle attached for TLS.
//! - **all other targets**: [`CannedHttp`], which answers from a table.

#[cfg(target_os = "espidf")]
use core::time::Duration;

use crate::error::FetchError;

/// Largest body accepted; the forecast for one day is about 1 KB.
pub const MAX_BODY_LEN: usize = 16 * 1024;

pub trait HttpClient {
    /// GET `url` and return the body of a 2xx response.
    fn get(&mut self, url: &str) -> Result<String, FetchError>;
}

#[cfg(target_os = "espidf")]
pub struct EspHttpClient {
    timeout: Duration,
}

#[cfg(target_os = "espidf")]
impl EspHttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[cfg(target_os = "espidf")]
impl HttpClient for EspHttpClient {
    fn get(&mut self, url: &str) -> Result<String, FetchError> {
        use embedded_svc::http::Method;
        use embedded_svc::http::client::Client;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use log::{info, warn};

        let config = Configuration {
            timeout: Some(self.timeout),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let transport = |e: esp_idf_svc::sys::EspError| {
            warn!("HTTP: transport error {}", e);
            FetchError::Transport
        };

        let connection = EspHttpConnection::new(&config).map_err(transport)?;
        let mut client = Client::wrap(connection);
        let mut response = client
            .request(Method::Get, url, &[("accept", "application/json")])
            .map_err(transport)?
            .submit()
            .map_err(transport)?;

        let status = response.status();
        info!("HTTP GET {} -> {}", url, status);
        if !(200..300).contains(&status) {
            return Err(FetchError::HttpStatus(status));
        }

        let mut body: Vec<u8> = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = response.read(&mut buf).map_err(transport)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
            if body.len() > MAX_BODY_LEN {
                return Err(FetchError::Malformed("response too large"));
            }
        }
        String::from_utf8(body).map_err(|_| FetchError::Malformed("body not UTF-8"))
    }
}

/// Host-side client answering from a table of `(url prefix, response)`.
/// Unmatched URLs fail as a transport error.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct CannedHttp {
    routes: Vec<(String, Result<String, FetchError>)>,
    /// URLs requested so far, in order.
    pub requests: Vec<String>,
}

#[cfg(not(target_os = "espidf"))]
impl CannedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: &str, response: Result<&str, FetchError>) -> Self {
        self.routes
            .push((prefix.to_owned(), response.map(str::to_owned)));
        self
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpClient for CannedHttp {
    fn get(&mut self, url: &str) -> Result<String, FetchError> {
        self.requests.push(url.to_owned());
        let body = self
            .routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or(Err(FetchError::Transport))?;
        if body.len() > MAX_BODY_LEN {
            return Err(FetchError::Malformed("response too large"));
        }
        Ok(body)
    }
}
