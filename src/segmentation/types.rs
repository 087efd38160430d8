use crate::raster::{RasterImage, SegmentationMask};
use anyhow::Result;

/// Foreground probability per pixel, 0.0 = background, 1.0 = person.
/// Flattened in row-major order.
pub type Matte = Vec<f32>;

/// Trait for person segmentation providers
/// Allows swapping the ONNX model for a scripted one in tests.
pub trait SegmentationProvider {
    /// Classify every pixel of `raster` as foreground or background.
    ///
    /// The returned mask must have the raster's dimensions; the compositor
    /// rejects anything else.
    fn segment(&mut self, raster: &RasterImage) -> Result<SegmentationMask>;

    /// Get the model's preferred input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32);
}
