use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{error, info};

/// Scratch directory for per-cycle artifacts: timestamped captures and the
/// matcher's diagnostic visualizations. Fully cleared at the start of every
/// cycle; nothing here survives a cycle on purpose.
pub struct Workdir {
    root: PathBuf,
}

impl Workdir {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create working directory {}", root.display()))?;
        Ok(Workdir { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Remove every regular file in the directory. Individual deletion
    /// failures are logged and skipped; clearing is best-effort.
    pub fn clear(&self) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                error!("cannot read working directory {}: {e}", self.root.display());
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Err(e) = fs::remove_file(&path) {
                    error!("cannot delete {}: {e}", path.display());
                }
            }
        }
    }

    /// Path for a capture named `<stem>_<timestamp>.png`.
    pub fn timestamped(&self, stem: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        self.root.join(format!("{stem}_{timestamp}.png"))
    }

    /// Persist capture bytes under a timestamped name.
    pub fn save(&self, stem: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.timestamped(stem);
        fs::write(&path, bytes)
            .with_context(|| format!("failed to write capture {}", path.display()))?;
        info!("capture saved to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
#[path = "workdir_test.rs"]
mod workdir_test;
