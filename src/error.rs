//! Error taxonomy for the compositing pipeline.
//!
//! Every variant is recoverable: a failing operation leaves the pipeline state
//! exactly as it was before the call.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("unsupported format: {mime} (accepted: JPG, PNG, JPEG)")]
    UnsupportedFormat { mime: String },

    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("segmentation model is not ready")]
    ModelNotReady,

    #[error("no image loaded")]
    NoImageLoaded,

    #[error("mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}")]
    DimensionMismatch {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("another operation is in progress")]
    OperationInProgress,

    #[error("failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("failed to encode image: {0}")]
    EncodeFailure(String),

    #[error("segmentation failed: {0}")]
    SegmentationFailed(String),

    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),
}

impl PipelineError {
    pub fn invalid_dimensions<W: std::fmt::Display, H: std::fmt::Display>(width: W, height: H) -> Self {
        PipelineError::InvalidDimensions(format!(
            "width={width}, height={height} (both must be positive integers)"
        ))
    }
}
