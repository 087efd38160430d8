use super::preprocess::Preprocessor;
use super::types::SegmentationProvider;
use crate::raster::{RasterImage, SegmentationMask};
use anyhow::{anyhow, bail, Context, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// Default foreground probability cut-off.
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// Default square model input edge.
pub const DEFAULT_INPUT_SIZE: u32 = 512;

/// Width and height of a `[1, 1, H, W]` matte; empty or oversized axes are
/// rejected.
fn matte_dimensions(shape: &[i64]) -> Result<(u32, u32)> {
    let axis = |v: i64| u32::try_from(v).ok().filter(|&v| v > 0);
    match shape {
        [1, 1, h, w] => match (axis(*w), axis(*h)) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => bail!("unexpected matte shape {:?}", shape),
        },
        _ => bail!("unexpected matte shape {:?}", shape),
    }
}

fn ort_error(err: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("ONNX Runtime: {err}")
}

/// Single-image person segmentation model
///
/// Expects one `[1, 3, H, W]` float input in `[0, 1]` and produces a
/// `[1, 1, H, W]` foreground probability matte as its first output.
pub struct OnnxSegmenter {
    session: Session,
    preprocessor: Preprocessor,
    width: u32,
    height: u32,
    threshold: f32,
}

impl OnnxSegmenter {
    /// Create a new segmenter from an ONNX file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `input_size` - Square input edge the model was exported with
    /// * `threshold` - Probability at or above which a pixel is foreground
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32, threshold: f32) -> Result<Self> {
        let path = model_path.as_ref();

        if input_size == 0 {
            bail!("model input size must be positive");
        }
        if !(0.0..=1.0).contains(&threshold) {
            bail!("threshold must be within [0, 1], got {threshold}");
        }

        tracing::info!("Loading segmentation model from {}", path.display());

        let builder = Session::builder().map_err(ort_error)?;
        let builder = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_error)?;
        let mut builder = builder.with_intra_threads(4).map_err(ort_error)?;
        let session = builder
            .commit_from_file(path)
            .map_err(ort_error)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("Segmentation model loaded successfully");

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(input_size, input_size),
            width: input_size,
            height: input_size,
            threshold,
        })
    }

    fn infer(&mut self, raster: &RasterImage) -> Result<(Vec<f32>, u32, u32)> {
        let input = self.preprocessor.preprocess(raster)?;
        let shape = [1usize, 3, self.height as usize, self.width as usize];
        let input = Tensor::from_array((shape, input.into_raw_vec())).map_err(ort_error)?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(ort_error)
            .context("Failed to run inference")?;

        // Matte is the first output (shape: [1, 1, H, W])
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(ort_error)?;
        let (width, height) = matte_dimensions(shape)?;

        Ok((data.to_vec(), width, height))
    }
}

impl SegmentationProvider for OnnxSegmenter {
    fn segment(&mut self, raster: &RasterImage) -> Result<SegmentationMask> {
        let _span = tracing::debug_span!("onnx_segment").entered();

        let (matte, matte_width, matte_height) = self.infer(raster)?;

        let (width, height) = raster.dimensions();
        let scores =
            Preprocessor::postprocess_matte(&matte, matte_width, matte_height, width, height)?;

        let mask = SegmentationMask::from_scores(width, height, &scores, self.threshold)?;
        tracing::debug!(
            "Segmented {}x{}: {} of {} pixels foreground",
            width,
            height,
            mask.foreground_count(),
            raster.pixel_count()
        );
        Ok(mask)
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
