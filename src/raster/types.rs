use crate::error::{PipelineError, Result};
use image::RgbaImage;

/// Decoded RGBA raster.
///
/// The pixel buffer always holds exactly `width * height * 4` bytes in
/// R,G,B,A order and both dimensions are non-zero. Rasters are never resized in
/// place; every pipeline stage produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    buffer: RgbaImage,
}

impl RasterImage {
    /// Build a raster from a raw RGBA buffer.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidBuffer(format!(
                "raster dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        let actual = pixels.len();
        let buffer = Some(pixels)
            .filter(|p| p.len() == expected)
            .and_then(|p| RgbaImage::from_raw(width, height, p))
            .ok_or_else(|| {
                PipelineError::InvalidBuffer(format!(
                    "expected {expected} bytes for {width}x{height} RGBA, got {actual}"
                ))
            })?;
        Ok(Self { buffer })
    }

    /// Wrap an `image` RGBA buffer, rejecting empty images.
    pub fn from_image(buffer: RgbaImage) -> Result<Self> {
        let (width, height) = buffer.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidBuffer(format!(
                "raster dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Raw RGBA bytes in row-major order.
    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.buffer
    }

    /// Alpha bytes only, one per pixel.
    pub fn alpha_channel(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixels().chunks_exact(4).map(|px| px[3])
    }
}

/// Per-pixel classification produced by a segmentation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Foreground,
    Background,
}

impl Classification {
    pub fn is_background(self) -> bool {
        self == Classification::Background
    }
}

/// Binary person/background mask aligned 1:1 with a raster's pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    classifications: Vec<Classification>,
}

impl SegmentationMask {
    /// Build a mask, checking that there is one classification per pixel.
    pub fn new(width: u32, height: u32, classifications: Vec<Classification>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if classifications.len() != expected {
            return Err(PipelineError::SegmentationFailed(format!(
                "expected {expected} classifications for {width}x{height}, got {}",
                classifications.len()
            )));
        }
        Ok(Self {
            width,
            height,
            classifications,
        })
    }

    /// Every pixel classified the same way.
    pub fn filled(width: u32, height: u32, class: Classification) -> Self {
        Self {
            width,
            height,
            classifications: vec![class; width as usize * height as usize],
        }
    }

    /// Build a mask from a per-pixel predicate over `(x, y)`.
    pub fn from_fn<F>(width: u32, height: u32, mut is_foreground: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut classifications = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                classifications.push(if is_foreground(x, y) {
                    Classification::Foreground
                } else {
                    Classification::Background
                });
            }
        }
        Self {
            width,
            height,
            classifications,
        }
    }

    /// Raw per-pixel labels as emitted by person-segmentation models:
    /// zero is background, anything else is foreground.
    pub fn from_labels(width: u32, height: u32, labels: &[u8]) -> Result<Self> {
        let classifications = labels
            .iter()
            .map(|&label| {
                if label == 0 {
                    Classification::Background
                } else {
                    Classification::Foreground
                }
            })
            .collect();
        Self::new(width, height, classifications)
    }

    /// Foreground probabilities in `[0, 1]`; a pixel is foreground when its
    /// score reaches `threshold`. NaN scores count as background.
    pub fn from_scores(width: u32, height: u32, scores: &[f32], threshold: f32) -> Result<Self> {
        let classifications = scores
            .iter()
            .map(|&score| {
                if score >= threshold {
                    Classification::Foreground
                } else {
                    Classification::Background
                }
            })
            .collect();
        Self::new(width, height, classifications)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn classifications(&self) -> &[Classification] {
        &self.classifications
    }

    pub fn foreground_count(&self) -> usize {
        self.classifications
            .iter()
            .filter(|c| !c.is_background())
            .count()
    }
}
