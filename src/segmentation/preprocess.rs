use super::types::Matte;
use crate::raster::RasterImage;
use anyhow::{ensure, Result};
use image::{imageops, DynamicImage, RgbImage};
use ndarray::Array4;

/// Preprocessor for converting rasters to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess a raster into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Drop alpha and resize to target dimensions
    /// 2. Convert to float and normalize to [0, 1]
    /// 3. Transpose from HWC to NCHW format
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, raster: &RasterImage) -> Result<Array4<f32>> {
        let _span = tracing::debug_span!("preprocess").entered();

        let rgb: RgbImage = DynamicImage::ImageRgba8(raster.as_rgba().clone()).to_rgb8();

        let resized = if rgb.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                &rgb,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            )
        } else {
            rgb
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, y as usize, x as usize]] = pixel[channel] as f32 / 255.0;
            }
        }

        Ok(tensor)
    }

    /// Resize a matte produced at model resolution back to the raster's
    /// dimensions.
    ///
    /// Returns: scores flattened in row-major order
    pub fn postprocess_matte(
        matte: &[f32],
        matte_width: u32,
        matte_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<Matte> {
        let _span = tracing::debug_span!("postprocess").entered();

        ensure!(
            matte_width > 0 && matte_height > 0,
            "matte is empty ({}x{})",
            matte_width,
            matte_height
        );
        ensure!(
            matte.len() == matte_width as usize * matte_height as usize,
            "matte has {} values, expected {}x{}",
            matte.len(),
            matte_width,
            matte_height
        );

        if matte_width == target_width && matte_height == target_height {
            return Ok(matte.to_vec());
        }

        let gray = image::GrayImage::from_fn(matte_width, matte_height, |x, y| {
            let idx = (y * matte_width + x) as usize;
            image::Luma([(matte[idx] * 255.0).round().clamp(0.0, 255.0) as u8])
        });

        let resized = imageops::resize(
            &gray,
            target_width,
            target_height,
            imageops::FilterType::Triangle,
        );

        Ok(resized.pixels().map(|p| p[0] as f32 / 255.0).collect())
    }
}
