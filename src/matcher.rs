//! Multi-scale template matching over grayscale captures.
//!
//! The template is resampled at a small range of scales and slid over the
//! full capture with zero-mean normalized cross-correlation; the single
//! best-scoring location per scale is recorded and the global winner across
//! scales decides the match. Scores land in [-1, 1], practically [0, 1].
//!
//! imageproc's built-in `CrossCorrelationNormalized` is not mean-centered
//! and saturates on flat regions, so the correlation core is computed here
//! directly, with integral images supplying per-window statistics. imageproc
//! still draws the diagnostic match-region rectangle.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::templates::Template;
use crate::types::MatchResult;

/// Smallest template scale factor evaluated.
pub const SCALE_MIN: f32 = 0.8;
/// Largest template scale factor evaluated.
pub const SCALE_MAX: f32 = 1.2;
/// Number of linearly spaced scales evaluated per match.
pub const SCALE_STEPS: usize = 5;

/// The scale factors every match evaluates, linearly spaced over
/// [`SCALE_MIN`, `SCALE_MAX`] inclusive.
pub fn scale_factors() -> [f32; SCALE_STEPS] {
    let step = (SCALE_MAX - SCALE_MIN) / (SCALE_STEPS as f32 - 1.0);
    std::array::from_fn(|i| SCALE_MIN + step * i as f32)
}

/// Best-scoring location for one evaluated scale.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScaleScore {
    pub scale: f32,
    pub score: f32,
    pub top_left: (u32, u32),
    pub size: (u32, u32),
}

/// Find the best match for `template` anywhere in `capture`.
///
/// Returns `matched == true` only when the winning confidence strictly
/// exceeds the template's threshold; a score exactly at the threshold is a
/// non-match. A template with no pixels (failed load) or one that does not
/// fit inside the capture at any scale is a definite non-match and is
/// logged, never raised.
///
/// When `debug_dir` is given, a copy of the capture with the best-match
/// region outlined is written there (`match_<label>.png`) whether or not
/// the match succeeded. This is a diagnostic artifact, not part of the
/// decision; write failures are logged and swallowed.
pub fn best_match(capture: &GrayImage, template: &Template, debug_dir: Option<&Path>) -> MatchResult {
    let Some(reference) = template.image() else {
        warn!("template '{}' has no pixels, treating as non-match", template.label());
        return MatchResult::no_match();
    };

    let evaluations = evaluate_scales(capture, reference);
    if evaluations.is_empty() {
        warn!(
            "template '{}' ({}x{}) does not fit inside the {}x{} capture at any scale",
            template.label(),
            reference.width(),
            reference.height(),
            capture.width(),
            capture.height()
        );
        return MatchResult::no_match();
    }

    // Strict > so ties resolve to the first-encountered scale in ascending
    // order.
    let mut best = &evaluations[0];
    for eval in &evaluations[1..] {
        if eval.score > best.score {
            best = eval;
        }
    }

    let result = MatchResult {
        confidence: best.score,
        top_left: best.top_left,
        size: best.size,
        scale: best.scale,
        matched: best.score > template.threshold(),
    };

    info!(
        "template '{}': best score {:.4} at scale {:.2}, top-left ({}, {})",
        template.label(),
        result.confidence,
        result.scale,
        result.top_left.0,
        result.top_left.1
    );

    if let Some(dir) = debug_dir {
        write_debug_image(capture, &result, template.label(), dir);
    }

    result
}

/// Evaluate the template against the capture at every scale factor,
/// recording the single best-scoring location per scale. Scales where the
/// resized template would not fit are skipped.
pub(crate) fn evaluate_scales(capture: &GrayImage, reference: &GrayImage) -> Vec<ScaleScore> {
    let stats = Integral::new(capture);

    scale_factors()
        .iter()
        .filter_map(|&scale| {
            let w = ((reference.width() as f32) * scale).round().max(1.0) as u32;
            let h = ((reference.height() as f32) * scale).round().max(1.0) as u32;
            if w > capture.width() || h > capture.height() {
                debug!("skipping scale {scale:.2}: resized template {w}x{h} exceeds capture");
                return None;
            }

            let resized = imageops::resize(reference, w, h, FilterType::Triangle);
            let (score, top_left) = best_location(capture, &stats, &resized);
            Some(ScaleScore {
                scale,
                score,
                top_left,
                size: (w, h),
            })
        })
        .collect()
}

/// Slide the (already resized) template over the capture and return the
/// highest zero-mean normalized cross-correlation score with its top-left
/// coordinate.
fn best_location(capture: &GrayImage, stats: &Integral, template: &GrayImage) -> (f32, (u32, u32)) {
    let (cap_w, cap_h) = capture.dimensions();
    let (tpl_w, tpl_h) = template.dimensions();
    let n = (tpl_w as f64) * (tpl_h as f64);

    // Center the template once; per-window centering then reduces to a dot
    // product against these residuals.
    let t_mean = template.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n;
    let centered: Vec<f64> = template.pixels().map(|p| p.0[0] as f64 - t_mean).collect();
    let t_var: f64 = centered.iter().map(|v| v * v).sum();
    if t_var <= f64::EPSILON {
        // Flat template: correlation is undefined everywhere.
        return (0.0, (0, 0));
    }

    let cap = capture.as_raw();
    let mut best_score = f64::NEG_INFINITY;
    let mut best_loc = (0u32, 0u32);

    for y in 0..=(cap_h - tpl_h) {
        for x in 0..=(cap_w - tpl_w) {
            let (sum, sum_sq) = stats.window(x, y, tpl_w, tpl_h);
            let window_var = sum_sq - sum * sum / n;
            if window_var <= 1e-12 {
                // Flat window, cannot correlate with a textured template.
                continue;
            }

            let mut dot = 0.0f64;
            let mut ti = 0usize;
            for row in 0..tpl_h {
                let base = ((y + row) * cap_w + x) as usize;
                for col in 0..tpl_w as usize {
                    dot += cap[base + col] as f64 * centered[ti];
                    ti += 1;
                }
            }

            let score = dot / (window_var * t_var).sqrt();
            if score > best_score {
                best_score = score;
                best_loc = (x, y);
            }
        }
    }

    if best_score == f64::NEG_INFINITY {
        // Entire capture is flat; nothing correlates.
        return (0.0, (0, 0));
    }

    (best_score.clamp(-1.0, 1.0) as f32, best_loc)
}

/// Summed-area tables of pixel values and squared values, giving O(1)
/// window sums for the correlation denominator.
struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl Integral {
    fn new(img: &GrayImage) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0; stride * (h + 1)];
        let mut sum_sq = vec![0.0; stride * (h + 1)];
        let raw = img.as_raw();

        for y in 0..h {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let v = raw[y * w + x] as f64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + (x + 1);
                sum[idx] = sum[y * stride + (x + 1)] + row_sum;
                sum_sq[idx] = sum_sq[y * stride + (x + 1)] + row_sq;
            }
        }

        Integral { stride, sum, sum_sq }
    }

    /// Sum and squared-sum over the window with top-left (x, y).
    fn window(&self, x: u32, y: u32, w: u32, h: u32) -> (f64, f64) {
        let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
        let st = self.stride;
        let a = y * st + x;
        let b = y * st + x + w;
        let c = (y + h) * st + x;
        let d = (y + h) * st + x + w;
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sum_sq[d] - self.sum_sq[b] - self.sum_sq[c] + self.sum_sq[a],
        )
    }
}

/// Write the capture with the best-match region outlined in red.
fn write_debug_image(capture: &GrayImage, result: &MatchResult, label: &str, dir: &Path) {
    let mut canvas: RgbImage = RgbImage::from_fn(capture.width(), capture.height(), |x, y| {
        let v = capture.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });

    if result.size.0 > 0 && result.size.1 > 0 {
        let rect = Rect::at(result.top_left.0 as i32, result.top_left.1 as i32)
            .of_size(result.size.0, result.size.1);
        draw_hollow_rect_mut(&mut canvas, rect, Rgb([255, 0, 0]));
    }

    let path = dir.join(format!("match_{label}.png"));
    match canvas.save(&path) {
        Ok(()) => debug!("match visualization written to {}", path.display()),
        Err(e) => warn!("could not write match visualization {}: {e}", path.display()),
    }
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod matcher_test;
