use anyhow::{Context, Result};
use clap::Parser;
use cutout::export::{ExportSink, FileExport, DEFAULT_EXPORT_FILE_NAME};
use cutout::intake::{self, DEFAULT_MAX_UPLOAD_BYTES};
use cutout::pipeline::ModelStatus;
use cutout::raster::{ResampleFilter, TargetSize};
use cutout::segmentation::{ModelLoader, DEFAULT_INPUT_SIZE, DEFAULT_THRESHOLD};
use cutout::{PipelineConfig, PipelineController};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input photo (JPG or PNG, at most 10 MiB by default)
    input: PathBuf,

    /// Output PNG path or directory
    #[arg(short, long, default_value = DEFAULT_EXPORT_FILE_NAME)]
    output: PathBuf,

    /// Override the mime type inferred from the input extension
    #[arg(long)]
    mime: Option<String>,

    /// Path to segmentation model (ONNX file)
    /// Required for --remove-background
    #[arg(long)]
    model: Option<PathBuf>,

    /// Make the background transparent
    #[arg(long)]
    remove_background: bool,

    /// Target width in pixels
    #[arg(long, requires = "height", allow_hyphen_values = true)]
    width: Option<String>,

    /// Target height in pixels
    #[arg(long, requires = "width", allow_hyphen_values = true)]
    height: Option<String>,

    /// Resampling filter
    #[arg(long, value_enum, default_value_t = ResampleFilter::Triangle)]
    filter: ResampleFilter,

    /// Foreground probability threshold
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f32,

    /// Square model input size
    #[arg(long, default_value_t = DEFAULT_INPUT_SIZE)]
    model_size: u32,

    /// Largest accepted upload in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn resize_target(args: &Args) -> Result<Option<TargetSize>> {
    match (&args.width, &args.height) {
        (Some(width), Some(height)) => Ok(Some(
            TargetSize::parse(width, height).context("Invalid resize request")?,
        )),
        _ => Ok(None),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Cutout starting");

    // Reject a bad resize request before any decoding or inference work
    let target = resize_target(&args)?;

    // Model initialisation runs in the background while the image is read
    let mut loader = args.model.clone().map(|path| {
        tracing::info!("Loading segmentation model from {}", path.display());
        ModelLoader::spawn_default(path, args.model_size, args.threshold)
    });

    let config = PipelineConfig::default()
        .with_filter(args.filter)
        .with_max_upload_bytes(args.max_upload_bytes);
    let mut controller = PipelineController::new(config);

    let upload = intake::read_upload(&args.input, args.mime.as_deref())?;
    controller
        .load(&upload)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    if args.remove_background {
        match loader.as_mut() {
            Some(loader) => {
                if controller.poll_model(loader) == ModelStatus::Loading {
                    tracing::info!("Waiting for segmentation model");
                }
            }
            None => tracing::warn!("No --model given; background removal is unavailable"),
        }
        if let Some(loader) = loader.take() {
            if controller.snapshot().model == ModelStatus::Loading {
                controller.install_model(loader.wait());
            }
        }

        controller
            .remove_background()
            .context("Failed to remove background")?;
    }

    if let Some(target) = target {
        controller
            .resize(target.width, target.height)
            .context("Failed to resize image")?;
    }

    let export = controller.export().context("Failed to export image")?;
    FileExport::new(&args.output).write_export(&export)?;

    let snapshot = controller.snapshot();
    if let Some((width, height)) = snapshot.working_dimensions {
        tracing::info!("Done: {}x{} -> {}", width, height, args.output.display());
    }

    Ok(())
}
