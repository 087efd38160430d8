mod composite;
mod resample;
pub mod types;

pub use composite::composite;
pub use resample::{resample, ResampleFilter, Resampler, TargetSize, DEFAULT_MAX_OUTPUT_BYTES};
pub use types::{Classification, RasterImage, SegmentationMask};
