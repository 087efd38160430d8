use anyhow::anyhow;
use cutout::codec::{ImageCodec, RasterCodec};
use cutout::intake::Upload;
use cutout::pipeline::{ModelStatus, RemovalOutcome, Stage};
use cutout::segmentation::{BoxedProvider, SegmentationProvider};
use cutout::{Classification, PipelineConfig, PipelineController, PipelineError};
use cutout::{RasterImage, SegmentationMask};

/// Provider that classifies with a fixed predicate over pixel coordinates.
struct ScriptedProvider<F> {
    is_foreground: F,
}

impl<F> SegmentationProvider for ScriptedProvider<F>
where
    F: Fn(u32, u32, u32, u32) -> bool,
{
    fn segment(&mut self, raster: &RasterImage) -> anyhow::Result<SegmentationMask> {
        let (w, h) = raster.dimensions();
        Ok(SegmentationMask::from_fn(w, h, |x, y| {
            (self.is_foreground)(x, y, w, h)
        }))
    }

    fn input_size(&self) -> (u32, u32) {
        (64, 64)
    }
}

struct BrokenProvider;

impl SegmentationProvider for BrokenProvider {
    fn segment(&mut self, _raster: &RasterImage) -> anyhow::Result<SegmentationMask> {
        Err(anyhow!("inference crashed"))
    }

    fn input_size(&self) -> (u32, u32) {
        (64, 64)
    }
}

/// Returns a mask one pixel narrower than the image.
struct MisalignedProvider;

impl SegmentationProvider for MisalignedProvider {
    fn segment(&mut self, raster: &RasterImage) -> anyhow::Result<SegmentationMask> {
        Ok(SegmentationMask::filled(
            raster.width() - 1,
            raster.height(),
            Classification::Background,
        ))
    }

    fn input_size(&self) -> (u32, u32) {
        (64, 64)
    }
}

fn central_block() -> BoxedProvider {
    Box::new(ScriptedProvider {
        is_foreground: |x: u32, y: u32, w: u32, h: u32| {
            let (x0, y0) = (w / 4, h / 4);
            x >= x0 && x < x0 + w / 2 && y >= y0 && y < y0 + h / 2
        },
    })
}

fn opaque_photo(width: u32, height: u32, seed: u8) -> RasterImage {
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).flat_map(move |x| {
                [
                    (x as u8).wrapping_mul(3).wrapping_add(seed),
                    (y as u8).wrapping_mul(5),
                    seed,
                    255,
                ]
            })
        })
        .collect();
    RasterImage::from_rgba(width, height, pixels).unwrap()
}

fn png_upload(raster: &RasterImage) -> Upload {
    Upload::new(ImageCodec.encode_png(raster).unwrap(), "image/png")
}

fn ready_controller(provider: BoxedProvider) -> PipelineController {
    let mut controller = PipelineController::new(PipelineConfig::default());
    assert_eq!(controller.install_model(Ok(provider)), ModelStatus::Ready);
    controller
}

#[test]
fn load_sets_original_and_working() {
    let mut controller = PipelineController::new(PipelineConfig::default());
    let photo = opaque_photo(12, 8, 1);

    let loaded = controller.load(&png_upload(&photo)).unwrap();

    assert_eq!(loaded, photo);
    let state = controller.state();
    assert_eq!(state.original(), Some(&photo));
    assert_eq!(state.working(), Some(&photo));
    assert_eq!(state.stage(), Stage::Ready);
    assert!(!state.busy());
}

#[test]
fn rejected_uploads_leave_state_untouched() {
    let mut controller = PipelineController::new(PipelineConfig::default());
    let before = controller.snapshot();

    let gif = Upload::new(b"GIF89a....".to_vec(), "image/gif");
    assert!(matches!(
        controller.load(&gif),
        Err(PipelineError::UnsupportedFormat { .. })
    ));

    let huge = Upload::new(vec![0; 11 * 1024 * 1024], "image/png");
    assert!(matches!(
        controller.load(&huge),
        Err(PipelineError::FileTooLarge { .. })
    ));

    let corrupt = Upload::new(b"\x89PNG but not really".to_vec(), "image/png");
    assert!(matches!(
        controller.load(&corrupt),
        Err(PipelineError::DecodeFailure(_))
    ));

    assert_eq!(controller.snapshot(), before);
    assert_eq!(controller.state().stage(), Stage::Idle);
}

#[test]
fn removal_checks_image_then_model() {
    let mut controller = PipelineController::new(PipelineConfig::default());
    assert_eq!(
        controller.remove_background(),
        Err(PipelineError::NoImageLoaded)
    );

    controller.load(&png_upload(&opaque_photo(4, 4, 0))).unwrap();
    assert_eq!(
        controller.remove_background(),
        Err(PipelineError::ModelNotReady)
    );
    assert_eq!(controller.state().stage(), Stage::Ready);
}

#[test]
fn failed_model_initialisation_is_permanent() {
    let mut controller = PipelineController::new(PipelineConfig::default());
    assert_eq!(
        controller.install_model(Err(anyhow!("weights missing"))),
        ModelStatus::Failed
    );
    assert_eq!(
        controller.install_model(Ok(central_block())),
        ModelStatus::Failed
    );

    controller.load(&png_upload(&opaque_photo(4, 4, 0))).unwrap();
    assert_eq!(
        controller.remove_background(),
        Err(PipelineError::ModelNotReady)
    );
    assert!(!controller.snapshot().can_remove_background());
}

#[test]
fn central_foreground_block_survives_removal() {
    let mut controller = ready_controller(central_block());
    controller
        .load(&png_upload(&opaque_photo(100, 100, 9)))
        .unwrap();

    let result = controller.remove_background().unwrap();

    assert_eq!(result.dimensions(), (100, 100));
    for (i, alpha) in result.alpha_channel().enumerate() {
        let (x, y) = (i as u32 % 100, i as u32 / 100);
        let inside = (25..75).contains(&x) && (25..75).contains(&y);
        assert_eq!(alpha, if inside { 255 } else { 0 }, "pixel ({x}, {y})");
    }
    assert_eq!(controller.state().working(), Some(&result));
    assert_eq!(controller.state().stage(), Stage::Ready);
}

#[test]
fn stale_segmentation_is_discarded() {
    let mut controller = ready_controller(central_block());
    let image_a = opaque_photo(20, 10, 1);
    let image_b = opaque_photo(30, 30, 2);

    controller.load(&png_upload(&image_a)).unwrap();
    let job = controller.begin_remove_background().unwrap();
    assert!(controller.state().busy());

    controller.load(&png_upload(&image_b)).unwrap();
    assert!(!controller.state().busy());

    let mask_for_a = SegmentationMask::filled(20, 10, Classification::Background);
    let outcome = controller
        .complete_remove_background(job, Ok(mask_for_a))
        .unwrap();

    assert_eq!(outcome, RemovalOutcome::Stale);
    assert_eq!(controller.state().working(), Some(&image_b));
    assert_eq!(controller.state().original(), Some(&image_b));
    assert_eq!(controller.state().stage(), Stage::Ready);

    // The new image can still be processed.
    let result = controller.remove_background().unwrap();
    assert_eq!(result.dimensions(), (30, 30));
}

#[test]
fn second_operation_while_segmenting_is_refused() {
    let mut controller = ready_controller(central_block());
    controller.load(&png_upload(&opaque_photo(8, 8, 3))).unwrap();

    let job = controller.begin_remove_background().unwrap();
    assert_eq!(controller.state().stage(), Stage::Segmenting);
    assert!(!controller.snapshot().can_edit());

    assert_eq!(
        controller.begin_remove_background().unwrap_err(),
        PipelineError::OperationInProgress
    );
    assert_eq!(
        controller.resize(4, 4),
        Err(PipelineError::OperationInProgress)
    );
    assert_eq!(controller.export(), Err(PipelineError::OperationInProgress));

    let mask = SegmentationMask::filled(8, 8, Classification::Foreground);
    let outcome = controller.complete_remove_background(job, Ok(mask)).unwrap();
    assert!(matches!(outcome, RemovalOutcome::Applied(_)));
    assert!(!controller.state().busy());
}

#[test]
fn failed_load_while_segmenting_keeps_the_job_valid() {
    let mut controller = ready_controller(central_block());
    let photo = opaque_photo(8, 6, 5);
    controller.load(&png_upload(&photo)).unwrap();

    let job = controller.begin_remove_background().unwrap();
    let corrupt = Upload::new(b"\x89PNG nope".to_vec(), "image/png");
    assert!(matches!(
        controller.load(&corrupt),
        Err(PipelineError::DecodeFailure(_))
    ));
    assert_eq!(controller.state().stage(), Stage::Segmenting);
    assert_eq!(controller.state().working(), Some(&photo));

    let mask = SegmentationMask::filled(8, 6, Classification::Foreground);
    let outcome = controller.complete_remove_background(job, Ok(mask)).unwrap();
    assert!(matches!(outcome, RemovalOutcome::Applied(_)));
    assert_eq!(controller.state().stage(), Stage::Ready);
}

#[test]
fn provider_failure_is_transactional() {
    let mut controller = ready_controller(Box::new(BrokenProvider));
    let photo = opaque_photo(6, 6, 4);
    controller.load(&png_upload(&photo)).unwrap();

    assert!(matches!(
        controller.remove_background(),
        Err(PipelineError::SegmentationFailed(msg)) if msg.contains("inference crashed")
    ));
    assert_eq!(controller.state().working(), Some(&photo));
    assert!(!controller.state().busy());
}

#[test]
fn misaligned_mask_is_a_dimension_mismatch() {
    let mut controller = ready_controller(Box::new(MisalignedProvider));
    let photo = opaque_photo(6, 5, 4);
    controller.load(&png_upload(&photo)).unwrap();

    assert_eq!(
        controller.remove_background(),
        Err(PipelineError::DimensionMismatch {
            image_width: 6,
            image_height: 5,
            mask_width: 5,
            mask_height: 5,
        })
    );
    assert_eq!(controller.state().working(), Some(&photo));
    assert_eq!(controller.state().stage(), Stage::Ready);
}

#[test]
fn resize_replaces_working_and_preview() {
    let mut controller = PipelineController::new(PipelineConfig::default());
    controller
        .load(&png_upload(&opaque_photo(200, 100, 5)))
        .unwrap();

    let resized = controller.resize(50, 50).unwrap();

    assert_eq!(resized.pixels().len(), 50 * 50 * 4);
    assert_eq!(controller.state().working(), Some(&resized));
    assert_eq!(controller.state().original(), Some(&resized));
    assert_eq!(
        controller.snapshot().working_dimensions,
        Some((50, 50))
    );
}

#[test]
fn invalid_resize_changes_nothing() {
    let mut controller = PipelineController::new(PipelineConfig::default());
    assert_eq!(controller.resize(10, 10), Err(PipelineError::NoImageLoaded));

    let photo = opaque_photo(10, 10, 6);
    controller.load(&png_upload(&photo)).unwrap();
    let before = controller.snapshot();

    assert!(matches!(
        controller.resize(0, 10),
        Err(PipelineError::InvalidDimensions(_))
    ));
    assert_eq!(controller.snapshot(), before);
    assert_eq!(controller.state().working(), Some(&photo));
}

#[test]
fn oversized_resize_is_refused_without_touching_state() {
    let mut controller = PipelineController::new(PipelineConfig::default());
    let photo = opaque_photo(10, 10, 6);
    controller.load(&png_upload(&photo)).unwrap();
    let before = controller.snapshot();

    assert!(matches!(
        controller.resize(u32::MAX, u32::MAX),
        Err(PipelineError::InvalidDimensions(_))
    ));
    assert_eq!(controller.snapshot(), before);
    assert_eq!(controller.state().working(), Some(&photo));
    assert_eq!(controller.state().stage(), Stage::Ready);
}

#[test]
fn resize_limit_comes_from_config() {
    let config = PipelineConfig::default().with_max_raster_bytes(40 * 40 * 4);
    let mut controller = PipelineController::new(config);
    controller.load(&png_upload(&opaque_photo(10, 10, 6))).unwrap();

    assert!(controller.resize(40, 40).is_ok());
    assert!(matches!(
        controller.resize(41, 40),
        Err(PipelineError::InvalidDimensions(_))
    ));
    assert_eq!(controller.snapshot().working_dimensions, Some((40, 40)));
}

#[test]
fn export_encodes_transparent_png() {
    let mut controller = ready_controller(central_block());
    assert_eq!(controller.export(), Err(PipelineError::NoImageLoaded));

    controller.load(&png_upload(&opaque_photo(16, 16, 7))).unwrap();
    let cutout = controller.remove_background().unwrap();
    let before = controller.snapshot();

    let export = controller.export().unwrap();

    assert_eq!(export.file_name, "processed-image.png");
    assert_eq!(
        ImageCodec.decode(&export.bytes, "image/png").unwrap(),
        cutout
    );
    assert_eq!(controller.snapshot(), before);
}

#[test]
fn full_pipeline_remove_then_resize_keeps_transparency() {
    let mut controller = ready_controller(Box::new(ScriptedProvider {
        is_foreground: |x: u32, _y: u32, w: u32, _h: u32| x < w / 2,
    }));
    controller
        .load(&png_upload(&opaque_photo(40, 20, 8)))
        .unwrap();

    controller.remove_background().unwrap();
    let resized = controller.resize(20, 10).unwrap();

    let alphas: Vec<u8> = resized.alpha_channel().collect();
    // Left edge stays opaque, right edge stays transparent.
    assert_eq!(alphas[0], 255);
    assert_eq!(alphas[19], 0);
    assert_eq!(controller.state().generation(), 1);
}
