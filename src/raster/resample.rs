use super::types::RasterImage;
use crate::error::{PipelineError, Result};
use image::imageops::{self, FilterType};

/// Reconstruction filter used when resampling.
///
/// Every filter treats alpha like any other channel, so opaque regions stay
/// opaque and nothing is forced to full opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ResampleFilter {
    Nearest,
    /// Bilinear
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl ResampleFilter {
    fn filter_type(self) -> FilterType {
        match self {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Validated target dimensions for a resize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: i64, height: i64) -> Result<Self> {
        let to_dim = |v: i64| u32::try_from(v).ok().filter(|&v| v > 0);
        match (to_dim(width), to_dim(height)) {
            (Some(width), Some(height)) => Ok(Self { width, height }),
            _ => Err(PipelineError::invalid_dimensions(width, height)),
        }
    }

    /// Parse the two user-entered fields of a resize request.
    ///
    /// Both must be present, numeric, finite, whole and strictly positive.
    pub fn parse(width: &str, height: &str) -> Result<Self> {
        let field = |raw: &str| -> Option<u32> {
            let value: f64 = raw.trim().parse().ok()?;
            if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > u32::MAX as f64
            {
                return None;
            }
            Some(value as u32)
        };
        match (field(width), field(height)) {
            (Some(width), Some(height)) => Ok(Self { width, height }),
            _ => Err(PipelineError::invalid_dimensions(
                format!("{width:?}"),
                format!("{height:?}"),
            )),
        }
    }
}

/// Largest output buffer a resample may allocate, matching the `image`
/// crate's default decoder allocation limit (512 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 512 * 1024 * 1024;

/// Stretches a raster to arbitrary dimensions over its full extent.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    filter: ResampleFilter,
    max_output_bytes: u64,
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new(ResampleFilter::default())
    }
}

impl Resampler {
    pub fn new(filter: ResampleFilter) -> Self {
        Self {
            filter,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: u64) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    /// Resample `source` to exactly `width` x `height`. Aspect ratio is not
    /// preserved; each axis is scaled independently.
    pub fn resample(&self, source: &RasterImage, width: u32, height: u32) -> Result<RasterImage> {
        let _span = tracing::debug_span!("resample").entered();

        if width == 0 || height == 0 {
            return Err(PipelineError::invalid_dimensions(width, height));
        }

        let output_bytes = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .filter(|&bytes| bytes <= self.max_output_bytes);
        if output_bytes.is_none() {
            return Err(PipelineError::InvalidDimensions(format!(
                "{width}x{height} exceeds the {} byte output limit",
                self.max_output_bytes
            )));
        }

        tracing::debug!(
            "Resampling {}x{} -> {}x{} ({:?})",
            source.width(),
            source.height(),
            width,
            height,
            self.filter
        );

        let resized = imageops::resize(source.as_rgba(), width, height, self.filter.filter_type());
        RasterImage::from_image(resized)
    }
}

/// Resample with the default (bilinear) filter.
pub fn resample(source: &RasterImage, width: u32, height: u32) -> Result<RasterImage> {
    Resampler::default().resample(source, width, height)
}
