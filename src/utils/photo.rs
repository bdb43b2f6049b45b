//! Photo attachments are stored inline as `data:` URIs.

use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

fn mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Read an image file into a `data:` URI.
pub fn data_uri(path: &Path) -> Result<String> {
    let mime = mime_type(path)
        .with_context(|| format!("{} is not a supported image type", path.display()))?;
    let bytes = std::fs::read(path).with_context(|| format!("Could not read {}", path.display()))?;

    Ok(encode(mime, &bytes))
}
