//! # pixelwatch
//!
//! A polling watchdog for a browser-based application that exposes no API:
//! the only hook into application state is pixel content.
//!
//! Every cycle, pixelwatch opens a fresh headless browser session,
//! navigates to the configured page, screenshots it, visually locates a
//! "home" control with multi-scale template matching, clicks it, waits for
//! the page to settle, screenshots again, tries an ordered list of "action"
//! controls, clicks the first one that matches, and raises a web-hook
//! notification. The session is then torn down and the process sleeps
//! until the next cycle. It runs forever; only external termination stops
//! it.
//!
//! ## Configuration
//!
//! Everything is configured through the environment, read once at startup:
//!
//! ```bash
//! MONITOR_HOST=app.internal \
//! MONITOR_PORT=8080 \
//! NOTIFY_KEY=SCT... \
//! CHECK_INTERVAL=300 \
//! pixelwatch
//! ```
//!
//! Template images (`home.png`, `action_1.png`, `action_2.png`) are loaded
//! from the directory containing the executable; captures and diagnostic
//! match visualizations land in a `tmp/` directory next to it, cleared at
//! the start of every cycle.
//!
//! A chromedriver instance must be reachable (default
//! `http://localhost:9515`, override with `WEBDRIVER_URL`).

#![allow(clippy::uninlined_format_args)]

pub mod browser;
pub mod config;
pub mod matcher;
pub mod monitor;
pub mod notify;
pub mod templates;
pub mod types;
pub mod workdir;
