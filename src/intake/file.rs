use super::Upload;
use anyhow::{Context, Result};
use image::ImageFormat;
use std::path::Path;

/// Mime type implied by a file's extension.
pub fn mime_for_path(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

/// Read a file from disk as an upload, declaring its mime type from the
/// extension unless `mime` overrides it.
pub fn read_upload<P: AsRef<Path>>(path: P, mime: Option<&str>) -> Result<Upload> {
    let path = path.as_ref();

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mime = mime
        .map(str::to_string)
        .unwrap_or_else(|| mime_for_path(path));

    tracing::info!(
        "Read {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime
    );

    Ok(Upload::new(bytes, mime))
}
