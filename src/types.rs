use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Outcome of one template-matching attempt against a capture.
///
/// Derived value only: consumed immediately by the click dispatch and
/// never persisted across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Zero-mean normalized cross-correlation score in [-1, 1].
    pub confidence: f32,
    /// Top-left corner of the best-matching region, in capture pixels.
    pub top_left: (u32, u32),
    /// Dimensions of the matched region (template size at the winning scale).
    pub size: (u32, u32),
    /// Scale factor the template was resampled by for the winning match.
    pub scale: f32,
    /// Whether the confidence strictly exceeded the template's threshold.
    pub matched: bool,
}

impl MatchResult {
    /// A definite non-match, used when an input image is missing or the
    /// template cannot fit inside the capture at any scale.
    pub fn no_match() -> Self {
        MatchResult {
            confidence: 0.0,
            top_left: (0, 0),
            size: (0, 0),
            scale: 0.0,
            matched: false,
        }
    }

    /// Center of the matched bounding box, the coordinate clicks are
    /// dispatched at.
    pub fn center(&self) -> (u32, u32) {
        (
            self.top_left.0 + self.size.0 / 2,
            self.top_left.1 + self.size.1 / 2,
        )
    }
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for ViewportSize {
    /// The fixed window size every session is opened with. Capture pixel
    /// coordinates are only valid click coordinates while captures come out
    /// at exactly this size.
    fn default() -> Self {
        ViewportSize {
            width: 1920,
            height: 1080,
        }
    }
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1920x1080")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1920x1080)");
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width in viewport size"))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height in viewport size"))?;

        Ok(ViewportSize { width, height })
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
