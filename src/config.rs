use crate::intake::IntakePolicy;
use crate::raster::{ResampleFilter, DEFAULT_MAX_OUTPUT_BYTES};

/// Settings for a [`PipelineController`](crate::pipeline::PipelineController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub intake: IntakePolicy,
    pub filter: ResampleFilter,
    /// Upper bound on the RGBA buffer a resize may produce.
    pub max_raster_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intake: IntakePolicy::default(),
            filter: ResampleFilter::default(),
            max_raster_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl PipelineConfig {
    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_max_raster_bytes(mut self, max_bytes: u64) -> Self {
        self.max_raster_bytes = max_bytes;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_bytes: u64) -> Self {
        self.intake = self.intake.with_max_bytes(max_bytes);
        self
    }
}
