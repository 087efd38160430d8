mod file;

pub use file::FileExport;

use anyhow::Result;

/// File name offered for downloads.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "processed-image.png";

/// Encoded PNG ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Trait for export destinations
pub trait ExportSink {
    /// Deliver an exported image
    fn write_export(&mut self, export: &ExportedImage) -> Result<()>;
}
