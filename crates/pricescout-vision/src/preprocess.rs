//! Image preparation for on-device classifier models

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use pricescout_types::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Square input size expected by MobileNet-style classifiers
pub const MODEL_INPUT_SIZE: u32 = 224;

static NEXT_INPUT_ID: AtomicU64 = AtomicU64::new(0);

/// Decode an image and resize it to `size`×`size`
pub fn load_model_input(image_path: &Path, size: u32) -> Result<DynamicImage> {
    let img = image::open(image_path)?;
    Ok(img.resize_exact(size, size, FilterType::Triangle))
}

/// Write the resized model input as a temporary PNG and return its path.
///
/// Call [`cleanup_model_input`] once the model has read it.
pub fn write_model_input(image_path: &Path, size: u32) -> Result<PathBuf> {
    let img = load_model_input(image_path, size)?;
    let id = NEXT_INPUT_ID.fetch_add(1, Ordering::Relaxed);
    let out_path = std::env::temp_dir().join(format!(
        "pricescout_input_{}_{}.png",
        std::process::id(),
        id
    ));
    img.to_rgb8().save_with_format(&out_path, ImageFormat::Png)?;
    Ok(out_path)
}

/// Remove a temporary model input file
pub fn cleanup_model_input(path: &Path) {
    let _ = std::fs::remove_file(path);
}
