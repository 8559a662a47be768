//! Device photo discovery for estimate and batch runs

use pricescout_types::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Formats the preprocessing step can decode
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Check that a device photo exists and decodes
pub fn validate_image(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(if path.exists() {
            Error::InvalidImageFormat(format!("device photo {} is not a file", path.display()))
        } else {
            Error::FileNotFound(path.display().to_string())
        });
    }

    if !is_supported_image(path) {
        return Err(Error::InvalidImageFormat(format!(
            "device photo {} has an unsupported extension (expected one of {})",
            path.display(),
            PHOTO_EXTENSIONS.join(", ")
        )));
    }

    image::open(path).map_err(|e| {
        Error::InvalidImageFormat(format!("device photo {} cannot be decoded: {}", path.display(), e))
    })?;

    Ok(())
}

/// Collect device photos under `dir`, recursively.
///
/// Photos come back in path order: each directory's entries sorted by
/// name, subfolders walked where they sort.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(if dir.exists() {
            Error::InvalidInput(format!("{} is not a folder of device photos", dir.display()))
        } else {
            Error::FileNotFound(dir.display().to_string())
        });
    }

    let photos: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    debug!(folder = %dir.display(), count = photos.len(), "scanned device photos");
    Ok(photos)
}
