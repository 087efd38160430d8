//! Person cut-out pipeline: decode a photo, make its background transparent
//! using a segmentation mask, optionally resample it, and export it as PNG.
//!
//! | Stage | Module |
//! |---|---|
//! | Upload checks | [`intake`] |
//! | Decode / PNG encode | [`codec`] |
//! | Person segmentation | [`segmentation`] |
//! | Alpha compositing, resampling | [`raster`] |
//! | Session state machine | [`pipeline`] |
//! | Download output | [`export`] |

pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod intake;
pub mod pipeline;
pub mod raster;
pub mod segmentation;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::PipelineController;
pub use raster::{Classification, RasterImage, SegmentationMask};
