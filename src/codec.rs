//! Raster codec boundary: bytes in, [`RasterImage`] out, PNG bytes back.

use crate::error::{PipelineError, Result};
use crate::raster::RasterImage;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

/// Decode and encode rasters.
pub trait RasterCodec {
    /// Decode `bytes` declared as `mime` into an RGBA raster.
    fn decode(&self, bytes: &[u8], mime: &str) -> Result<RasterImage>;

    /// Encode a raster as PNG, preserving the alpha channel.
    fn encode_png(&self, raster: &RasterImage) -> Result<Vec<u8>>;
}

/// Codec backed by the `image` crate's pure Rust JPEG/PNG decoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

/// Map an accepted mime type to the decoder that handles it.
pub fn format_for_mime(mime: &str) -> Option<ImageFormat> {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        _ => None,
    }
}

impl RasterCodec for ImageCodec {
    fn decode(&self, bytes: &[u8], mime: &str) -> Result<RasterImage> {
        let _span = tracing::debug_span!("decode").entered();

        let format = format_for_mime(mime).ok_or_else(|| PipelineError::UnsupportedFormat {
            mime: mime.to_string(),
        })?;

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| PipelineError::DecodeFailure(e.to_string()))?;

        let color = decoded.color();
        let rgba = decoded.to_rgba8();
        tracing::debug!(
            "Decoded {:?} {}x{} ({:?})",
            format,
            rgba.width(),
            rgba.height(),
            color
        );

        RasterImage::from_image(rgba).map_err(|e| PipelineError::DecodeFailure(e.to_string()))
    }

    fn encode_png(&self, raster: &RasterImage) -> Result<Vec<u8>> {
        let _span = tracing::debug_span!("encode").entered();

        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                raster.pixels(),
                raster.width(),
                raster.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| PipelineError::EncodeFailure(e.to_string()))?;

        Ok(bytes)
    }
}
