use std::path::Path;

use image::GrayImage;
use tracing::{error, info};

/// Default match-confidence threshold.
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// An immutable reference image of a UI control to locate, with its label
/// and match-confidence threshold. Loaded once at startup, never mutated.
pub struct Template {
    label: String,
    threshold: f32,
    image: Option<GrayImage>,
}

impl Template {
    /// Load a template from disk, converting to grayscale. A missing or
    /// undecodable file is logged here and leaves the template without
    /// pixels; every match against it is then a definite non-match. The
    /// store never aborts the process over a bad template.
    pub fn load(label: &str, path: &Path, threshold: f32) -> Self {
        let image = match image::open(path) {
            Ok(img) => {
                let gray = img.to_luma8();
                info!(
                    "loaded template '{}' from {} ({}x{})",
                    label,
                    path.display(),
                    gray.width(),
                    gray.height()
                );
                Some(gray)
            }
            Err(e) => {
                error!("cannot read template '{}' at {}: {e}", label, path.display());
                None
            }
        };

        Template {
            label: label.to_string(),
            threshold,
            image,
        }
    }

    /// Build a template from an already-decoded image. Used by tests and
    /// synthetic captures.
    pub fn from_image(label: &str, image: GrayImage, threshold: f32) -> Self {
        Template {
            label: label.to_string(),
            threshold,
            image: Some(image),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// The grayscale reference pixels, or `None` when loading failed.
    pub fn image(&self) -> Option<&GrayImage> {
        self.image.as_ref()
    }
}

/// The fixed set of reference images: one home control plus the action
/// controls in priority order.
pub struct TemplateSet {
    pub home: Template,
    pub actions: Vec<Template>,
}

impl TemplateSet {
    /// Load the template store from fixed paths relative to the program's
    /// own location: `home.png`, `action_1.png`, `action_2.png`.
    pub fn load(dir: &Path) -> Self {
        let home = Template::load("home", &dir.join("home.png"), DEFAULT_THRESHOLD);
        let actions = (1..=2)
            .map(|i| {
                Template::load(
                    &format!("action-{i}"),
                    &dir.join(format!("action_{i}.png")),
                    DEFAULT_THRESHOLD,
                )
            })
            .collect();

        TemplateSet { home, actions }
    }
}
