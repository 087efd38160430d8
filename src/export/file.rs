use super::{ExportSink, ExportedImage};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes exports to disk.
///
/// A directory target receives the export under its own file name; any other
/// path is written as-is.
pub struct FileExport {
    target: PathBuf,
}

impl FileExport {
    pub fn new<P: AsRef<Path>>(target: P) -> Self {
        Self {
            target: target.as_ref().to_path_buf(),
        }
    }

    /// Path an export will be written to.
    pub fn destination(&self, export: &ExportedImage) -> PathBuf {
        if self.target.is_dir() {
            self.target.join(&export.file_name)
        } else {
            self.target.clone()
        }
    }
}

impl ExportSink for FileExport {
    fn write_export(&mut self, export: &ExportedImage) -> Result<()> {
        let path = self.destination(export);

        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(&export.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("Wrote {} ({} bytes)", path.display(), export.bytes.len());
        Ok(())
    }
}
