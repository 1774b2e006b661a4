//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`]. `begin()` only kicks off association; the
//! connectivity machine polls `is_connected()` against its own deadlines,
//! so nothing here blocks or retries on its own.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` plus raw
//!   `esp_wifi_*` calls for RSSI and credential erase.
//! - **all other targets**: a simulated link the tests can steer.

use core::net::Ipv4Addr;

use log::info;

use super::utils::is_printable_ascii;
use crate::app::ports::{NetworkInfo, NetworkPort};
use crate::error::ConnectivityError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
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
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    /// Simulation: whether `begin()` reaches the access point.
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_begin_calls: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            sim_reachable: true,
            sim_connected: false,
            sim_begin_calls: 0,
        }
    }

    /// Validate and store station credentials. Takes effect on the next
    /// `begin()`.
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&config)
            .map_err(|_| ConnectivityError::DriverError)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| ConnectivityError::DriverError)?;
        }
        // A previous attempt may still be in flight.
        let _ = self.wifi.disconnect();
        self.wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self) -> Result<(), ConnectivityError> {
        self.sim_begin_calls += 1;
        self.sim_connected = self.sim_reachable;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_address(&self) -> Option<Ipv4Addr> {
        let ip = self.wifi.sta_netif().get_ip_info().ok()?.ip;
        Some(Ipv4Addr::from(ip.octets()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_address(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 4, 2))
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        // SAFETY: fills a caller-owned record; fails cleanly when not associated.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == esp_idf_svc::sys::ESP_OK).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        Some(-60)
    }

    #[cfg(target_os = "espidf")]
    fn platform_erase(&mut self) -> Result<(), ConnectivityError> {
        let _ = self.wifi.disconnect();
        // SAFETY: resets the driver's persisted station config to defaults.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_restore() };
        if ret != esp_idf_svc::sys::ESP_OK {
            log::warn!("WiFi: esp_wifi_restore failed ({})", ret);
            return Err(ConnectivityError::DriverError);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_erase(&mut self) -> Result<(), ConnectivityError> {
        self.sim_connected = false;
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ── Simulation controls ───────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    /// Whether future `begin()` calls reach the access point.
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
    }

    /// Drop an established link, as if the access point vanished.
    pub fn sim_drop_link(&mut self) {
        self.sim_connected = false;
    }

    pub fn sim_begin_calls(&self) -> u32 {
        self.sim_begin_calls
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn begin(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        info!("WiFi: associating with '{}'", self.ssid);
        self.platform_begin()
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn info(&self) -> NetworkInfo {
        if !self.is_connected() {
            return NetworkInfo {
                ssid: self.ssid.clone(),
                ..NetworkInfo::default()
            };
        }
        NetworkInfo {
            ssid: self.ssid.clone(),
            address: self.platform_address(),
            rssi: self.platform_rssi(),
        }
    }

    fn erase_credentials(&mut self) -> Result<(), ConnectivityError> {
        self.ssid.clear();
        self.password.clear();
        self.platform_erase()?;
        info!("WiFi: stored credentials erased");
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
