use std::time::Duration;

use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::ViewportSize;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("session launch failed: {0}")]
    Launch(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("click dispatch failed: {0}")]
    Click(String),
}

/// One headless Chrome session driven over WebDriver.
///
/// A session lives for exactly one probe cycle: it is created fresh, used
/// sequentially by the cycle controller, and torn down unconditionally at
/// the cycle boundary. The temporary profile directory is removed with it,
/// so no browser state survives between cycles.
pub struct Browser {
    client: Client,
    // Held for the session's lifetime; dropping it deletes the profile.
    _profile_dir: TempDir,
}

impl Browser {
    /// Connect to the WebDriver endpoint and open a fresh headless session
    /// at the fixed window size.
    pub async fn launch(webdriver_url: &str, viewport: ViewportSize) -> Result<Self> {
        info!("connecting to WebDriver at {webdriver_url}");

        if !Self::is_webdriver_running(webdriver_url).await {
            anyhow::bail!(
                "cannot connect to WebDriver at {webdriver_url}.\n\
                Please ensure chromedriver is running:\n\
                  chromedriver --port 9515"
            );
        }

        let profile_dir = tempfile::Builder::new()
            .prefix("pixelwatch-")
            .tempdir()
            .context("failed to create temporary profile directory")?;

        let mut chrome_opts = serde_json::Map::new();
        let args = vec![
            "--headless=new".to_string(),
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--ignore-certificate-errors".to_string(),
            format!("--window-size={},{}", viewport.width, viewport.height),
            format!("--user-data-dir={}", profile_dir.path().display()),
        ];
        chrome_opts.insert("args".to_string(), json!(args));

        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))
            .context("failed to connect to WebDriver")?;

        // Window size is requested via Chrome args too; this is best-effort
        // reinforcement, not a hard requirement.
        if let Err(e) = client
            .set_window_size(viewport.width, viewport.height)
            .await
        {
            debug!("could not set window size: {e}");
        }

        Ok(Browser {
            client,
            _profile_dir: profile_dir,
        })
    }

    async fn is_webdriver_running(url: &str) -> bool {
        let status_url = format!("{url}/status");
        match reqwest::get(&status_url).await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("navigating to {url}");
        self.client
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        Ok(())
    }

    /// Poll document readiness up to `timeout`, then apply the fixed settle
    /// delay so deferred rendering finishes before the capture. Returns
    /// `false` on timeout (a soft failure; the cycle skips its remaining
    /// steps).
    pub async fn wait_until_loaded(&self, timeout: Duration, settle: Duration) -> Result<bool> {
        let script = "return document.readyState === 'complete';";
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match self.client.execute(script, vec![]).await {
                Ok(val) if val.as_bool().unwrap_or(false) => break,
                Ok(_) => {}
                Err(e) => debug!("readiness poll failed: {e}"),
            }
            if tokio::time::Instant::now() >= deadline {
                warn!("page load timed out after {}s", timeout.as_secs());
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        tokio::time::sleep(settle).await;
        Ok(true)
    }

    /// Full-viewport PNG screenshot of the current page.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .screenshot()
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))?;
        Ok(bytes)
    }

    /// Hit-test click at a capture-pixel coordinate against the live page.
    /// Valid only while capture resolution equals the viewport resolution.
    pub async fn click_at(&self, x: u32, y: u32) -> Result<()> {
        let script = r#"
            const x = arguments[0], y = arguments[1];
            const el = document.elementFromPoint(x, y);
            if (el) { el.click(); return true; }
            return false;
        "#;

        let hit = self
            .client
            .execute(script, vec![json!(x), json!(y)])
            .await
            .map_err(|e| BrowserError::Click(e.to_string()))?;

        if hit.as_bool().unwrap_or(false) {
            info!("clicked at ({x}, {y})");
        } else {
            warn!("no element at ({x}, {y}), click not dispatched");
        }
        Ok(())
    }

    /// Clean session teardown.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
