/// Sniff an image media type from its leading bytes.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, b'h', b'e', b'i', b'c' | b'x', ..] => "image/heic",
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, b'm', b'i', b'f', b'1', ..] => "image/heif",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

/// Media types the completion service accepts as inline image parts.
pub fn is_supported_image_mime(media_type: &str) -> bool {
    matches!(
        media_type.to_ascii_lowercase().as_str(),
        "image/jpeg" | "image/png" | "image/webp" | "image/gif" | "image/heic" | "image/heif"
    )
}
