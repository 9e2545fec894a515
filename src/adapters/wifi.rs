//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`]: one bounded association attempt per
//! call.  Retrying across candidate networks is the orchestrator's job.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi`, polled
//!   until the STA netif is up or the timeout expires.
//! - **all other targets**: simulation with a configurable set of
//!   reachable SSIDs.

use core::time::Duration;

use heapless::String;
use log::{info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort};
use crate::config::NetworkCredential;

#[cfg(target_os = "espidf")]
use esp_idf_svc::eventloop::EspSystemEventLoop;
#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::EspDefaultNvsPartition;
#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// Every byte in `0x20..=0x7E` (space through tilde).
fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

/// Empty means an open network; otherwise WPA2 length rules.
pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    /// Simulation: SSIDs that accept a connection.  `None` = all.
    #[cfg(not(target_os = "espidf"))]
    reachable: Option<std::vec::Vec<std::string::String>>,
    connected_to: Option<String<32>>,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: esp_idf_hal::modem::Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> anyhow::Result<Self> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        info!("WiFi: driver created");
        Ok(Self {
            wifi,
            connected_to: None,
        })
    }

    /// Simulated radio where every network is in range.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            reachable: None,
            connected_to: None,
        }
    }

    /// Simulated radio where only `ssids` are in range.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_reachable(ssids: &[&str]) -> Self {
        Self {
            reachable: Some(ssids.iter().map(|s| (*s).to_owned()).collect()),
            connected_to: None,
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(
        &mut self,
        credential: &NetworkCredential,
        timeout: Duration,
    ) -> Result<(), ConnectivityError> {
        let auth_method = if credential.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: credential.ssid.clone(),
            password: credential.password.clone(),
            auth_method,
            ..Default::default()
        });

        let fail = |e: esp_idf_svc::sys::EspError| {
            warn!("WiFi: driver error {}", e);
            ConnectivityError::ConnectionFailed
        };
        self.wifi.set_configuration(&cfg).map_err(fail)?;
        if !self.wifi.is_started().map_err(fail)? {
            self.wifi.start().map_err(fail)?;
        }
        self.wifi.connect().map_err(fail)?;

        let deadline = std::time::Instant::now() + timeout;
        loop {
            let associated = self.wifi.is_connected().unwrap_or(false);
            let up = self.wifi.sta_netif().is_up().unwrap_or(false);
            if associated && up {
                return Ok(());
            }
            if std::time::Instant::now() >= deadline {
                let _ = self.wifi.disconnect();
                return Err(ConnectivityError::Timeout);
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(
        &mut self,
        credential: &NetworkCredential,
        _timeout: Duration,
    ) -> Result<(), ConnectivityError> {
        let in_range = self
            .reachable
            .as_ref()
            .is_none_or(|list| list.iter().any(|s| s == credential.ssid.as_str()));
        if in_range {
            Ok(())
        } else {
            warn!("WiFi(sim): '{}' not in range", credential.ssid);
            Err(ConnectivityError::Timeout)
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(
        &mut self,
        credential: &NetworkCredential,
        timeout: Duration,
    ) -> Result<(), ConnectivityError> {
        validate_ssid(&credential.ssid)?;
        validate_password(&credential.password)?;

        if self.connected_to.as_ref() == Some(&credential.ssid) {
            return Ok(());
        }

        info!("WiFi: connecting to '{}' ({:?} max)", credential.ssid, timeout);
        self.connected_to = None;
        self.platform_connect(credential, timeout)?;
        self.connected_to = Some(credential.ssid.clone());
        info!("WiFi: connected to '{}'", credential.ssid);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connected_to.take().is_some() {
            self.platform_disconnect();
            info!("WiFi: disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.connected_to.is_some() && self.wifi.is_connected().unwrap_or(false)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.connected_to.is_some()
        }
    }

    fn ssid(&self) -> Option<&str> {
        self.connected_to.as_deref()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
