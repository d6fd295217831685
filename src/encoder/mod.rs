//! Image encoding for multi-part requests
//!
//! Turns a raw image resource (a file on disk or bytes already in memory)
//! into an [`ImagePayload`]: a media type plus bare base64 data. Size limits
//! are the caller's concern; see [`crate::validation`].

pub mod mime;

pub use mime::{detect_image_mime, is_supported_image_mime};

use crate::models::ImagePayload;
use crate::{Error, Result};
use base64::Engine as _;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// An image as captured by the UI, before encoding.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub source: ImageSource,
    /// Declared media type; sniffed from the bytes when absent.
    pub media_type: Option<String>,
}

impl RawImage {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ImageSource::Path(path.into()),
            media_type: None,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            source: ImageSource::Bytes(bytes),
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    fn describe(&self) -> String {
        match &self.source {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

/// Encode raw bytes. Never includes a `data:` prefix.
pub fn encode_bytes(bytes: &[u8], media_type: Option<&str>) -> ImagePayload {
    let media_type = match media_type {
        Some(declared) => {
            if !is_supported_image_mime(declared) {
                tracing::warn!("Declared media type '{}' is not a known image type", declared);
            }
            declared.to_string()
        }
        None => detect_image_mime(bytes).to_string(),
    };

    ImagePayload::new(
        media_type,
        base64::engine::general_purpose::STANDARD.encode(bytes),
    )
}

/// Read and encode one image. Any read failure becomes [`Error::Encoding`].
pub async fn encode(image: &RawImage) -> Result<ImagePayload> {
    let bytes = match &image.source {
        ImageSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
            tracing::error!("Failed to read image {}: {}", path.display(), e);
            Error::Encoding(format!("Failed to read image '{}': {}", path.display(), e))
        })?,
        ImageSource::Bytes(bytes) => bytes.clone(),
    };

    if bytes.is_empty() {
        return Err(Error::Encoding(format!(
            "Image '{}' is empty",
            image.describe()
        )));
    }

    let payload = encode_bytes(&bytes, image.media_type.as_deref());
    tracing::debug!(
        "Encoded image {} ({} bytes, {})",
        image.describe(),
        bytes.len(),
        payload.media_type
    );
    Ok(payload)
}

async fn encode_optional(image: Option<&RawImage>) -> Result<Option<ImagePayload>> {
    match image {
        Some(image) => encode(image).await.map(Some),
        None => Ok(None),
    }
}

/// Encode the reference and essay images concurrently.
///
/// The result is always `(reference, essay)`, whichever read finishes first.
pub async fn encode_pair(
    reference: Option<&RawImage>,
    essay: Option<&RawImage>,
) -> Result<(Option<ImagePayload>, Option<ImagePayload>)> {
    let (reference, essay) = tokio::join!(encode_optional(reference), encode_optional(essay));
    Ok((reference?, essay?))
}

/// Remove a leading `data:<type>;base64,` prefix, if present.
pub fn strip_data_uri_prefix(value: &str) -> &str {
    if !value.starts_with("data:") {
        return value;
    }
    match value.find(";base64,") {
        Some(idx) => &value[idx + ";base64,".len()..],
        None => value,
    }
}
