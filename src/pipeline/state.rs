use crate::raster::RasterImage;

/// Pipeline stage. Everything other than `Idle` and `Ready` is a busy stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Decoding,
    Ready,
    Segmenting,
    Compositing,
    Resampling,
    Exporting,
}

impl Stage {
    pub fn is_busy(self) -> bool {
        !matches!(self, Stage::Idle | Stage::Ready)
    }
}

/// Readiness of the segmentation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Loading,
    Ready,
    /// Initialisation failed; stays failed for the rest of the session.
    Failed,
}

/// Working state of one editing session.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub(super) original: Option<RasterImage>,
    pub(super) working: Option<RasterImage>,
    pub(super) model: ModelStatus,
    pub(super) stage: Stage,
    /// Bumped on every successful load; in-flight jobs compare against it.
    pub(super) generation: u64,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            original: None,
            working: None,
            model: ModelStatus::Loading,
            stage: Stage::Idle,
            generation: 0,
        }
    }
}

impl PipelineState {
    pub fn original(&self) -> Option<&RasterImage> {
        self.original.as_ref()
    }

    pub fn working(&self) -> Option<&RasterImage> {
        self.working.as_ref()
    }

    pub fn model_ready(&self) -> bool {
        self.model == ModelStatus::Ready
    }

    pub fn busy(&self) -> bool {
        self.stage.is_busy()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            stage: self.stage,
            busy: self.busy(),
            model: self.model,
            original_dimensions: self.original.as_ref().map(RasterImage::dimensions),
            working_dimensions: self.working.as_ref().map(RasterImage::dimensions),
            generation: self.generation,
        }
    }
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSnapshot {
    pub stage: Stage,
    pub busy: bool,
    pub model: ModelStatus,
    pub original_dimensions: Option<(u32, u32)>,
    pub working_dimensions: Option<(u32, u32)>,
    pub generation: u64,
}

impl PipelineSnapshot {
    /// Whether the "remove background" control should be enabled.
    pub fn can_remove_background(&self) -> bool {
        !self.busy && self.model == ModelStatus::Ready && self.working_dimensions.is_some()
    }

    /// Whether the resize and export controls should be enabled.
    pub fn can_edit(&self) -> bool {
        !self.busy && self.working_dimensions.is_some()
    }
}
