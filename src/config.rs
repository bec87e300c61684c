use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

/// Default inter-cycle sleep, in seconds.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Process configuration, read once from the environment at startup and
/// passed explicitly into the cycle controller.
///
/// Recognized variables:
/// - `MONITOR_HOST` (required): host of the monitored page
/// - `MONITOR_PORT` (optional): port; the base URL omits it when absent
/// - `NOTIFY_KEY` (required): key for the notification web hook
/// - `CHECK_INTERVAL` (optional): seconds between cycles, default 300
/// - `WEBDRIVER_URL` (optional): chromedriver endpoint, default
///   `http://localhost:9515`
#[derive(Debug, Clone)]
pub struct Config {
    /// Target host being monitored.
    pub host: String,
    /// Optional target port.
    pub port: Option<u16>,
    /// Notification service key.
    pub notify_key: String,
    /// Sleep between probe cycles.
    pub check_interval: Duration,
    /// WebDriver endpoint the browser sessions are created against.
    pub webdriver_url: String,
    base_url: Url,
}

impl Config {
    /// Read configuration from the process environment. A malformed or
    /// missing required variable is the only fatal error in the program;
    /// everything after startup is retried forever.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an injected variable lookup. Tests use this
    /// to avoid mutating process-global environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("MONITOR_HOST")
            .filter(|v| !v.is_empty())
            .context("MONITOR_HOST must be set to the host of the monitored page")?;

        let port = match lookup("MONITOR_PORT").filter(|v| !v.is_empty()) {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .with_context(|| format!("invalid MONITOR_PORT: {raw}"))?,
            ),
            None => None,
        };

        let notify_key = lookup("NOTIFY_KEY")
            .filter(|v| !v.is_empty())
            .context("NOTIFY_KEY must be set to the notification service key")?;

        let check_interval = match lookup("CHECK_INTERVAL").filter(|v| !v.is_empty()) {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("invalid CHECK_INTERVAL: {raw}"))?,
            ),
            None => Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
        };

        let webdriver_url = lookup("WEBDRIVER_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string());

        let raw_url = match port {
            Some(port) => format!("http://{host}:{port}"),
            None => format!("http://{host}"),
        };
        let base_url =
            Url::parse(&raw_url).with_context(|| format!("invalid target address: {raw_url}"))?;

        Ok(Config {
            host,
            port,
            notify_key,
            check_interval,
            webdriver_url,
            base_url,
        })
    }

    /// The address every cycle navigates to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
