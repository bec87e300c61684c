#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixelwatch::config::Config;
use pixelwatch::monitor::Monitor;
use pixelwatch::notify::Notifier;
use pixelwatch::templates::TemplateSet;
use pixelwatch::workdir::Workdir;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pixelwatch=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    // Configuration problems are the only fatal errors; everything after
    // this point is retried forever.
    let config = Config::from_env().context("invalid configuration")?;

    let exe_dir = exe_dir().context("cannot determine program location")?;
    let templates = TemplateSet::load(&exe_dir);
    let workdir = Workdir::new(exe_dir.join("tmp"))?;
    let notifier = Notifier::new(&config.notify_key);

    info!("pixelwatch starting");
    Monitor::new(config, templates, workdir, notifier).run().await
}

/// Directory containing the running executable; templates and working
/// storage live relative to it.
fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot resolve executable path")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?;
    Ok(dir.to_path_buf())
}
