//! Classifier capability and simple implementations

pub mod command;
pub mod response;

use pricescout_types::{Classification, Error, Result};
use std::path::Path;

/// Anything that can name the device in a photo.
///
/// Implementations may be unavailable (no model configured) or fail per
/// image; callers decide how to fall back.
pub trait Classifier: Send + Sync {
    /// Short identifier, also used to scope cached classifications
    fn name(&self) -> &str;

    /// Return the top prediction for the image
    fn classify(&self, image_path: &Path) -> Result<Classification>;

    /// Whether results depend only on image content and may be cached
    fn cacheable(&self) -> bool {
        true
    }
}

/// Returns the same label for every image.
///
/// Used when the user already knows what the device is.
#[derive(Debug, Clone)]
pub struct FixedLabelClassifier {
    label: String,
}

impl FixedLabelClassifier {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Classifier for FixedLabelClassifier {
    fn name(&self) -> &str {
        "fixed-label"
    }

    fn classify(&self, _image_path: &Path) -> Result<Classification> {
        Ok(Classification::new(self.label.clone(), None))
    }

    fn cacheable(&self) -> bool {
        false
    }
}

/// Stand-in when no classifier command is configured
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredClassifier;

impl Classifier for UnconfiguredClassifier {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn classify(&self, _image_path: &Path) -> Result<Classification> {
        Err(Error::ClassifierUnavailable(
            "no classifier command configured (pricescout config --set-classifier-cmd \"...\")"
                .to_string(),
        ))
    }

    fn cacheable(&self) -> bool {
        false
    }
}
