//! WiFi access-point adapter.
//!
//! The gauge hosts its own network: clients join the AP and browse to the
//! telemetry server. Credential validation runs on every target; bring-up
//! is ESP-IDF only.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi` in AP mode, WPA2
//!   personal (or open when the password is empty).
//! - **all other targets**: validation only; the host tests bind the
//!   telemetry server on loopback instead.

use log::{error, info};

use crate::error::{CommsError, Error};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// Space through tilde.
fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::InvalidSsid);
    }
    Ok(())
}

/// Empty means an open network; otherwise WPA2 requires 8-64 bytes.
pub fn validate_password(password: &str) -> Result<(), CommsError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 || !is_printable_ascii(password) {
        return Err(CommsError::InvalidPassword);
    }
    Ok(())
}

pub fn validate_credentials(ssid: &str, password: &str) -> Result<(), Error> {
    validate_ssid(ssid)?;
    validate_password(password)?;
    Ok(())
}

/// Log which bring-up step failed and fold it into [`CommsError::AccessPointFailed`].
pub fn bring_up_failed(step: &'static str, cause: impl core::fmt::Display) -> Error {
    error!("WiFi: {} failed: {}", step, cause);
    Error::Comms(CommsError::AccessPointFailed)
}

/// Boot banner telling the operator how to reach the dashboard.
pub fn log_instructions(ssid: &str, ip: impl core::fmt::Display, port: u16) {
    info!("WiFi: AP '{}' is up", ssid);
    info!("WiFi: join it and open http://{}:{}/", ip, port);
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF bring-up
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn start_access_point(
    modem: esp_idf_svc::hal::modem::Modem,
    sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
    nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
    config: &crate::config::SystemConfig,
) -> crate::error::Result<esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>> {
    use esp_idf_svc::wifi::{
        AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi,
    };

    validate_credentials(&config.ap_ssid, &config.ap_password)?;

    let driver =
        EspWifi::new(modem, sysloop.clone(), nvs).map_err(|e| bring_up_failed("driver init", e))?;
    let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(|e| bring_up_failed("wrap", e))?;

    let auth_method = if config.ap_password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };
    let ap = AccessPointConfiguration {
        ssid: config
            .ap_ssid
            .as_str()
            .try_into()
            .map_err(|_| Error::Comms(CommsError::InvalidSsid))?,
        password: config
            .ap_password
            .as_str()
            .try_into()
            .map_err(|_| Error::Comms(CommsError::InvalidPassword))?,
        auth_method,
        channel: 1,
        ..Default::default()
    };

    wifi.set_configuration(&Configuration::AccessPoint(ap))
        .map_err(|e| bring_up_failed("configure", e))?;
    wifi.start().map_err(|e| bring_up_failed("start", e))?;
    wifi.wait_netif_up().map_err(|e| bring_up_failed("netif up", e))?;

    let ip = wifi
        .wifi()
        .ap_netif()
        .get_ip_info()
        .map_err(|e| bring_up_failed("ip info", e))?
        .ip;
    log_instructions(&config.ap_ssid, ip, config.http_port);
    Ok(wifi)
}
