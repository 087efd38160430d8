//! Session controller: one working image, one operation at a time.
//!
//! Synchronous stages (decode, composite, resample, encode) run inside a
//! single call. Segmentation is the one stage that may outlive a call, so it
//! is split into [`PipelineController::begin_remove_background`] and
//! [`PipelineController::complete_remove_background`]; a result that comes
//! back after a newer image was loaded is reported as
//! [`RemovalOutcome::Stale`] and never touches the working raster.

mod controller;
mod state;

pub use controller::{PipelineController, RemovalOutcome, SegmentationJob};
pub use state::{ModelStatus, PipelineSnapshot, PipelineState, Stage};
