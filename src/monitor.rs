//! The cycle controller: one top-level loop driving the
//! navigate → wait → capture → match → click → notify state machine, with
//! the browser session scoped to a single cycle and released on every exit
//! path. Failures never terminate the process; every cycle-level fault is
//! caught at the cycle boundary, logged, and followed by the sleep step.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use image::GrayImage;
use tracing::{error, info, warn};

use crate::browser::Browser;
use crate::config::Config;
use crate::matcher;
use crate::notify::Notifier;
use crate::templates::{Template, TemplateSet};
use crate::types::{MatchResult, ViewportSize};
use crate::workdir::Workdir;

/// Bounded wait for document readiness.
const LOAD_TIMEOUT: Duration = Duration::from_secs(60);
/// Fixed delay after load completion so deferred rendering finishes.
const SETTLE_DELAY: Duration = Duration::from_secs(15);
/// Short stabilize delay immediately before each screenshot.
const PRE_CAPTURE_DELAY: Duration = Duration::from_secs(5);

/// How a probe cycle ended. Log output is the only identity a cycle has.
#[derive(Debug)]
enum CycleOutcome {
    /// An action control was found and clicked; a notification was raised.
    ActionClicked { label: String },
    /// The home control matched but no action control did.
    ActionExhausted,
    /// The home control was not found on the page.
    HomeNotMatched,
    /// A page load exceeded the bounded wait.
    LoadTimedOut,
    /// Capture dimensions did not equal the configured viewport, so click
    /// coordinates would have been wrong.
    ViewportMismatch,
    /// A capture could not be decoded.
    CaptureUndecodable,
}

/// A decoded screenshot; the raw bytes were already saved to working
/// storage under a timestamped name.
struct Capture {
    gray: GrayImage,
}

pub struct Monitor {
    config: Config,
    templates: TemplateSet,
    workdir: Workdir,
    notifier: Notifier,
    viewport: ViewportSize,
}

impl Monitor {
    pub fn new(
        config: Config,
        templates: TemplateSet,
        workdir: Workdir,
        notifier: Notifier,
    ) -> Self {
        Monitor {
            config,
            templates,
            workdir,
            notifier,
            viewport: ViewportSize::default(),
        }
    }

    /// Run probe cycles forever. Only external termination stops the loop.
    pub async fn run(&self) -> Result<()> {
        info!("watchdog running, monitoring {}", self.config.base_url());

        loop {
            self.workdir.clear();

            match self.run_cycle().await {
                Ok(outcome) => info!("cycle finished: {outcome:?}"),
                Err(e) => error!("cycle failed: {e:#}"),
            }

            info!(
                "sleeping {}s until next check",
                self.config.check_interval.as_secs()
            );
            tokio::time::sleep(self.config.check_interval).await;
        }
    }

    /// One full cycle with scoped session ownership: the browser is created
    /// here and torn down here, whatever the probe's outcome.
    async fn run_cycle(&self) -> Result<CycleOutcome> {
        let browser = Browser::launch(&self.config.webdriver_url, self.viewport)
            .await
            .context("could not open browser session")?;

        let outcome = self.probe(&browser).await;

        if let Err(e) = browser.close().await {
            warn!("session teardown failed: {e:#}");
        }

        outcome
    }

    /// The probe state machine, against an already-open session.
    async fn probe(&self, browser: &Browser) -> Result<CycleOutcome> {
        browser.goto(self.config.base_url().as_str()).await?;

        if !browser.wait_until_loaded(LOAD_TIMEOUT, SETTLE_DELAY).await? {
            return Ok(CycleOutcome::LoadTimedOut);
        }

        let Some(capture) = self.capture(browser, "home_page").await? else {
            return Ok(CycleOutcome::CaptureUndecodable);
        };

        // Click coordinates are capture-pixel coordinates; they only land
        // where intended while captures come out at exactly the viewport
        // size, so the assumption is checked instead of trusted.
        let (w, h) = capture.gray.dimensions();
        if (w, h) != (self.viewport.width, self.viewport.height) {
            warn!(
                "capture is {w}x{h} but viewport is {}x{}, skipping click",
                self.viewport.width, self.viewport.height
            );
            return Ok(CycleOutcome::ViewportMismatch);
        }

        let home = matcher::best_match(
            &capture.gray,
            &self.templates.home,
            Some(self.workdir.path()),
        );
        if !home.matched {
            info!(
                "home control not found (confidence {:.4} below threshold)",
                home.confidence
            );
            return Ok(CycleOutcome::HomeNotMatched);
        }

        let (x, y) = home.center();
        browser.click_at(x, y).await.context("home click failed")?;
        info!("clicked home control");

        if !browser.wait_until_loaded(LOAD_TIMEOUT, SETTLE_DELAY).await? {
            warn!("page load after home click timed out");
            return Ok(CycleOutcome::LoadTimedOut);
        }

        let Some(capture) = self.capture(browser, "after_home_click").await? else {
            return Ok(CycleOutcome::CaptureUndecodable);
        };

        match select_action(
            &capture.gray,
            &self.templates.actions,
            Some(self.workdir.path()),
        ) {
            Some((index, template, result)) => {
                let (x, y) = result.center();
                browser.click_at(x, y).await.context("action click failed")?;
                info!(
                    "clicked action control '{}' (template {})",
                    template.label(),
                    index + 1
                );

                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
                self.notifier
                    .send(
                        "pixelwatch alert",
                        &format!("clicked action control '{}' at {timestamp}", template.label()),
                    )
                    .await;

                Ok(CycleOutcome::ActionClicked {
                    label: template.label().to_string(),
                })
            }
            None => {
                warn!("no action control matched any template");
                Ok(CycleOutcome::ActionExhausted)
            }
        }
    }

    /// Screenshot the page, persist it under a timestamped name, and decode
    /// it for matching. An undecodable capture is logged and reported as
    /// `None`, a definite non-match; the cycle continues where possible.
    async fn capture(&self, browser: &Browser, stem: &str) -> Result<Option<Capture>> {
        tokio::time::sleep(PRE_CAPTURE_DELAY).await;

        let bytes = browser.screenshot().await?;
        let path = self.workdir.save(stem, &bytes)?;

        match image::load_from_memory(&bytes) {
            Ok(img) => Ok(Some(Capture {
                gray: img.to_luma8(),
            })),
            Err(e) => {
                error!("cannot decode capture {}: {e}", path.display());
                Ok(None)
            }
        }
    }
}

/// Try each action template strictly in priority order and stop at the
/// first whose confidence exceeds its threshold. The search is lazy: once a
/// template wins, later ones are not evaluated (their diagnostics are only
/// written for attempts actually made).
fn select_action<'a>(
    capture: &GrayImage,
    actions: &'a [Template],
    debug_dir: Option<&std::path::Path>,
) -> Option<(usize, &'a Template, MatchResult)> {
    actions.iter().enumerate().find_map(|(index, template)| {
        let result = matcher::best_match(capture, template, debug_dir);
        result.matched.then_some((index, template, result))
    })
}

#[cfg(test)]
#[path = "monitor_test.rs"]
mod monitor_test;
