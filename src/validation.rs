//! Pre-conditions checked before a submission reaches the core.

use crate::{Error, Result};
use std::path::Path;

/// Largest image accepted at capture time.
pub const MAX_IMAGE_BYTES: u64 = 4 * 1024 * 1024;

pub fn validate_topic(topic: &str) -> Result<()> {
    if topic.trim().is_empty() {
        return Err(Error::Validation(
            "Please enter the essay topic or question.".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_image_size(len: u64) -> Result<()> {
    if len > MAX_IMAGE_BYTES {
        return Err(Error::Validation(format!(
            "Image is too large ({:.1} MB). The maximum size is 4 MB.",
            len as f64 / (1024.0 * 1024.0)
        )));
    }
    Ok(())
}

/// Check an image file's size from its metadata, without reading it.
pub async fn validate_image_file(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        Error::Validation(format!("Cannot access image '{}': {}", path.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(Error::Validation(format!(
            "'{}' is not a file",
            path.display()
        )));
    }

    validate_image_size(metadata.len())
}
