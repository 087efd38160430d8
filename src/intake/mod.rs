mod file;

pub use file::{mime_for_path, read_upload};

use crate::error::{PipelineError, Result};

/// Largest upload accepted by default (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Mime types accepted by default.
pub const DEFAULT_ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];

/// Raw file bytes plus the declared mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Type and size gate applied before any decode is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePolicy {
    pub max_bytes: u64,
    pub accepted_types: Vec<String>,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            accepted_types: DEFAULT_ACCEPTED_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl IntakePolicy {
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn accepts(&self, mime: &str) -> bool {
        let mime = mime.trim();
        self.accepted_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(mime))
    }

    /// Type is checked before size.
    pub fn validate(&self, upload: &Upload) -> Result<()> {
        if !self.accepts(&upload.mime) {
            return Err(PipelineError::UnsupportedFormat {
                mime: upload.mime.clone(),
            });
        }
        if upload.size() > self.max_bytes {
            return Err(PipelineError::FileTooLarge {
                size: upload.size(),
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}
