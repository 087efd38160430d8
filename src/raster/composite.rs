use super::types::{RasterImage, SegmentationMask};
use crate::error::{PipelineError, Result};

/// Make every background pixel of `source` fully transparent.
///
/// Colour channels are copied untouched and foreground pixels keep their
/// source alpha. The source raster is never modified.
pub fn composite(source: &RasterImage, mask: &SegmentationMask) -> Result<RasterImage> {
    let _span = tracing::debug_span!("composite").entered();

    if mask.dimensions() != source.dimensions() {
        return Err(PipelineError::DimensionMismatch {
            image_width: source.width(),
            image_height: source.height(),
            mask_width: mask.width(),
            mask_height: mask.height(),
        });
    }

    let mut output = source.clone().into_rgba();
    for (pixel, class) in output.pixels_mut().zip(mask.classifications()) {
        if class.is_background() {
            pixel[3] = 0;
        }
    }

    tracing::debug!(
        "Composited {}x{} raster, {} foreground pixels",
        source.width(),
        source.height(),
        mask.foreground_count()
    );

    RasterImage::from_image(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::types::Classification;

    fn photo(width: u32, height: u32) -> RasterImage {
        let pixels = (0..width * height)
            .flat_map(|i| [(i % 251) as u8, (i * 7 % 256) as u8, (i * 13 % 256) as u8, 255])
            .collect();
        RasterImage::from_rgba(width, height, pixels).unwrap()
    }

    #[test]
    fn all_background_is_fully_transparent() {
        let source = photo(8, 5);
        let mask = SegmentationMask::filled(8, 5, Classification::Background);
        let out = composite(&source, &mask).unwrap();
        assert!(out.alpha_channel().all(|a| a == 0));
    }

    #[test]
    fn colour_channels_survive_background_removal() {
        let source = photo(4, 4);
        let mask = SegmentationMask::filled(4, 4, Classification::Background);
        let out = composite(&source, &mask).unwrap();
        for (a, b) in out.pixels().chunks_exact(4).zip(source.pixels().chunks_exact(4)) {
            assert_eq!(&a[..3], &b[..3]);
        }
    }

    #[test]
    fn all_foreground_is_identity() {
        let source = photo(6, 3);
        let mask = SegmentationMask::filled(6, 3, Classification::Foreground);
        assert_eq!(composite(&source, &mask).unwrap(), source);
    }

    #[test]
    fn foreground_keeps_partial_source_alpha() {
        let source = RasterImage::from_rgba(2, 1, vec![10, 20, 30, 128, 40, 50, 60, 255]).unwrap();
        let mask = SegmentationMask::from_labels(2, 1, &[1, 0]).unwrap();
        let out = composite(&source, &mask).unwrap();
        assert_eq!(out.pixels(), &[10, 20, 30, 128, 40, 50, 60, 0]);
    }

    #[test]
    fn mismatched_mask_fails_and_leaves_inputs_alone() {
        let source = photo(4, 4);
        let mask = SegmentationMask::filled(4, 3, Classification::Background);
        let before = (source.clone(), mask.clone());

        let err = composite(&source, &mask).unwrap_err();
        assert_eq!(
            err,
            PipelineError::DimensionMismatch {
                image_width: 4,
                image_height: 4,
                mask_width: 4,
                mask_height: 3,
            }
        );
        assert_eq!((source, mask), before);
    }

    #[test]
    fn same_pixel_count_different_shape_is_a_mismatch() {
        let source = photo(4, 2);
        let mask = SegmentationMask::filled(2, 4, Classification::Foreground);
        assert!(matches!(
            composite(&source, &mask),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn composite_is_deterministic() {
        let source = photo(9, 9);
        let mask = SegmentationMask::from_fn(9, 9, |x, y| (x + y) % 3 == 0);
        assert_eq!(
            composite(&source, &mask).unwrap(),
            composite(&source, &mask).unwrap()
        );
    }
}
