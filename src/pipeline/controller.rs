use super::state::{ModelStatus, PipelineSnapshot, PipelineState, Stage};
use crate::codec::{ImageCodec, RasterCodec};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::export::{ExportedImage, DEFAULT_EXPORT_FILE_NAME};
use crate::intake::Upload;
use crate::raster::{self, RasterImage, Resampler, SegmentationMask};
use crate::segmentation::{BoxedProvider, ModelLoader};
use std::time::Instant;

/// An in-flight segmentation request.
///
/// Carries the raster the provider must classify and the session generation
/// it was taken from, so a result arriving after a new load can be recognised.
///
/// Every job must be handed back to
/// [`PipelineController::complete_remove_background`]; a dropped job leaves
/// the pipeline in [`Stage::Segmenting`] until the next successful load.
#[derive(Debug)]
#[must_use = "pass the job to `complete_remove_background` or the pipeline stays busy"]
pub struct SegmentationJob {
    generation: u64,
    source: RasterImage,
}

impl SegmentationJob {
    pub fn source(&self) -> &RasterImage {
        &self.source
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a completed segmentation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The composite replaced the working raster.
    Applied(RasterImage),
    /// The image was replaced while the job ran; the result was dropped.
    Stale,
}

/// Drives decode, background removal, resampling and export over a single
/// working image.
pub struct PipelineController {
    state: PipelineState,
    config: PipelineConfig,
    codec: Box<dyn RasterCodec>,
    resampler: Resampler,
    provider: Option<BoxedProvider>,
}

impl PipelineController {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_codec(config, ImageCodec)
    }

    pub fn with_codec<C: RasterCodec + 'static>(config: PipelineConfig, codec: C) -> Self {
        let resampler =
            Resampler::new(config.filter).with_max_output_bytes(config.max_raster_bytes);
        Self {
            state: PipelineState::default(),
            config,
            codec: Box::new(codec),
            resampler,
            provider: None,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.state.snapshot()
    }

    /// Accept the one-time readiness signal of the segmentation provider.
    ///
    /// A failed initialisation leaves the model permanently unavailable; any
    /// signal after the first is ignored.
    pub fn install_model(&mut self, result: anyhow::Result<BoxedProvider>) -> ModelStatus {
        if self.state.model != ModelStatus::Loading {
            tracing::warn!(
                "Ignoring repeated model readiness signal (model is {:?})",
                self.state.model
            );
            return self.state.model;
        }

        match result {
            Ok(provider) => {
                let (width, height) = provider.input_size();
                tracing::info!("Segmentation model ready (input {}x{})", width, height);
                self.provider = Some(provider);
                self.state.model = ModelStatus::Ready;
            }
            Err(e) => {
                tracing::error!("Segmentation model failed to initialise: {:#}", e);
                self.state.model = ModelStatus::Failed;
            }
        }
        self.state.model
    }

    /// Install the model if the loader has finished, without blocking.
    pub fn poll_model(&mut self, loader: &mut ModelLoader) -> ModelStatus {
        if self.state.model == ModelStatus::Loading {
            if let Some(result) = loader.try_ready() {
                return self.install_model(result);
            }
        }
        self.state.model
    }

    /// Validate and decode an upload, making it both the original and the
    /// working raster.
    ///
    /// Allowed while a segmentation job is in flight: the job's result becomes
    /// stale and the pipeline returns to `Ready` with the new image.
    pub fn load(&mut self, upload: &Upload) -> Result<RasterImage> {
        self.config.intake.validate(upload)?;

        let previous = self.state.stage;
        self.state.stage = Stage::Decoding;
        let start = Instant::now();

        let raster = match self.codec.decode(&upload.bytes, &upload.mime) {
            Ok(raster) => raster,
            Err(e) => {
                self.state.stage = previous;
                tracing::warn!("Decode failed: {}", e);
                return Err(e);
            }
        };

        if previous == Stage::Segmenting {
            tracing::info!("New image loaded during segmentation; pending result will be discarded");
        }

        self.state.generation += 1;
        self.state.original = Some(raster.clone());
        self.state.working = Some(raster.clone());
        self.state.stage = Stage::Ready;

        tracing::info!(
            "Loaded {}x{} image ({} bytes) in {:.1}ms",
            raster.width(),
            raster.height(),
            upload.size(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(raster)
    }

    /// Start background removal. The returned job must be finished with
    /// [`complete_remove_background`](Self::complete_remove_background).
    pub fn begin_remove_background(&mut self) -> Result<SegmentationJob> {
        if self.state.busy() {
            return Err(PipelineError::OperationInProgress);
        }
        let source = self
            .state
            .working
            .clone()
            .ok_or(PipelineError::NoImageLoaded)?;
        if self.state.model != ModelStatus::Ready {
            return Err(PipelineError::ModelNotReady);
        }

        self.state.stage = Stage::Segmenting;
        tracing::info!(
            "Segmenting {}x{} image (generation {})",
            source.width(),
            source.height(),
            self.state.generation
        );

        Ok(SegmentationJob {
            generation: self.state.generation,
            source,
        })
    }

    /// Apply a finished segmentation to the working raster, unless the image
    /// has been replaced since the job started.
    pub fn complete_remove_background(
        &mut self,
        job: SegmentationJob,
        mask: anyhow::Result<SegmentationMask>,
    ) -> Result<RemovalOutcome> {
        if job.generation != self.state.generation {
            tracing::warn!(
                "Discarding stale segmentation result (generation {} != {})",
                job.generation,
                self.state.generation
            );
            return Ok(RemovalOutcome::Stale);
        }

        let mask = match mask {
            Ok(mask) => mask,
            Err(e) => {
                self.state.stage = Stage::Ready;
                return Err(PipelineError::SegmentationFailed(format!("{e:#}")));
            }
        };

        self.state.stage = Stage::Compositing;
        let start = Instant::now();
        let composited = match raster::composite(&job.source, &mask) {
            Ok(composited) => composited,
            Err(e) => {
                self.state.stage = Stage::Ready;
                return Err(e);
            }
        };

        self.state.working = Some(composited.clone());
        self.state.stage = Stage::Ready;

        tracing::info!(
            "Background removed: {} of {} pixels kept ({:.1}ms)",
            mask.foreground_count(),
            composited.pixel_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(RemovalOutcome::Applied(composited))
    }

    /// Segment the working raster with the installed provider and composite
    /// the result.
    pub fn remove_background(&mut self) -> Result<RasterImage> {
        let job = self.begin_remove_background()?;

        let start = Instant::now();
        let mask = match self.provider.as_mut() {
            Some(provider) => provider.segment(job.source()),
            None => {
                self.state.stage = Stage::Ready;
                return Err(PipelineError::ModelNotReady);
            }
        };
        tracing::debug!(
            "Segmentation took {:.1}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        match self.complete_remove_background(job, mask)? {
            RemovalOutcome::Applied(raster) => Ok(raster),
            RemovalOutcome::Stale => Err(PipelineError::SegmentationFailed(
                "result superseded by a newer image".to_string(),
            )),
        }
    }

    /// Stretch the working raster to `width` x `height`. The result also
    /// becomes the cached preview.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<RasterImage> {
        if self.state.busy() {
            return Err(PipelineError::OperationInProgress);
        }
        let source = self
            .state
            .working
            .as_ref()
            .ok_or(PipelineError::NoImageLoaded)?;

        let previous = self.state.stage;
        self.state.stage = Stage::Resampling;
        let start = Instant::now();

        let resized = match self.resampler.resample(source, width, height) {
            Ok(resized) => resized,
            Err(e) => {
                self.state.stage = previous;
                return Err(e);
            }
        };

        tracing::info!(
            "Resized {}x{} -> {}x{} ({:?}) in {:.1}ms",
            source.width(),
            source.height(),
            width,
            height,
            self.resampler.filter(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        self.state.working = Some(resized.clone());
        self.state.original = Some(resized.clone());
        self.state.stage = Stage::Ready;

        Ok(resized)
    }

    /// Encode the working raster as PNG.
    pub fn export(&mut self) -> Result<ExportedImage> {
        if self.state.busy() {
            return Err(PipelineError::OperationInProgress);
        }
        let working = self
            .state
            .working
            .as_ref()
            .ok_or(PipelineError::NoImageLoaded)?;

        let previous = self.state.stage;
        self.state.stage = Stage::Exporting;
        let encoded = self.codec.encode_png(working);
        self.state.stage = previous;

        let bytes = encoded?;
        tracing::info!(
            "Exported {}x{} image as PNG ({} bytes)",
            working.width(),
            working.height(),
            bytes.len()
        );

        Ok(ExportedImage::new(DEFAULT_EXPORT_FILE_NAME, bytes))
    }
}
