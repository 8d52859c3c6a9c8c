use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use deface_studio_core::anonymization::domain::anonymization_params::{
    AnonymizationMethod, AnonymizationParams,
};
use deface_studio_core::anonymization::infrastructure::deface_anonymizer::DefaceAnonymizer;
use deface_studio_core::pipeline::anonymize_batch_use_case::AnonymizeBatchUseCase;
use deface_studio_core::pipeline::batch_events::{BatchEvent, ExtractionEvent};
use deface_studio_core::pipeline::batch_executor::BatchExecutor;
use deface_studio_core::pipeline::extract_frames_use_case::ExtractFramesUseCase;
use deface_studio_core::pipeline::extraction_job::{
    ExtractionConfig, ExtractionStatus, FrameFormat, SamplingInterval,
};
use deface_studio_core::pipeline::infrastructure::sequential_batch_executor::SequentialBatchExecutor;
use deface_studio_core::pipeline::infrastructure::threaded_batch_executor::ThreadedBatchExecutor;
use deface_studio_core::pipeline::job::{JobConfig, JobStatus};
use deface_studio_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use deface_studio_core::shared::constants::{
    DEFACE_PROGRAM, DEFAULT_FRAME_INTERVAL_SECONDS, DEFAULT_MASK_SCALE, DEFAULT_MOSAIC_SIZE,
    DEFAULT_OUTPUT_SUFFIX, DEFAULT_THRESHOLD,
};
use deface_studio_core::shared::media_type::images_in_dir;
use deface_studio_core::shared::video_metadata::Rotation;
use deface_studio_core::video::infrastructure::ffmpeg_probe::FfmpegProbe;
use deface_studio_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use deface_studio_core::video::infrastructure::ffmpeg_remuxer::FfmpegRemuxer;
use deface_studio_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Batch face anonymization with deface, and frame extraction.
#[derive(Parser)]
#[command(name = "deface-batch", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Anonymize faces in videos and images.
    Anonymize(AnonymizeArgs),
    /// Save every k-th frame of videos as images.
    Extract(ExtractArgs),
}

#[derive(Args)]
struct AnonymizeArgs {
    /// Video or image files. A folder adds the images directly inside it.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output folder.
    #[arg(short, long)]
    output: PathBuf,

    /// Masking style: blur, box or mosaic.
    #[arg(long, default_value = "blur")]
    method: AnonymizationMethod,

    /// Detection threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    thresh: f64,

    /// Scale factor for the masked area around each face.
    #[arg(long, default_value_t = DEFAULT_MASK_SCALE)]
    mask_scale: f64,

    /// Run detection on media shrunk by this factor (1.0 = full size).
    #[arg(long, default_value_t = 1.0)]
    downscale: f64,

    /// Use rectangular masks instead of ellipses.
    #[arg(long)]
    boxes: bool,

    /// Draw detection scores onto the output.
    #[arg(long)]
    draw_scores: bool,

    /// Mosaic cell size in pixels (mosaic method only).
    #[arg(long, default_value_t = DEFAULT_MOSAIC_SIZE)]
    mosaic_size: u32,

    /// Remux inputs with damaged containers and retry once.
    #[arg(long)]
    repair: bool,

    /// Appended to each output file name.
    #[arg(long, default_value = DEFAULT_OUTPUT_SUFFIX)]
    suffix: String,

    /// Files processed at the same time.
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// deface command, e.g. "deface" or "python3 -m deface".
    #[arg(long, default_value = DEFACE_PROGRAM)]
    deface: String,
}

#[derive(Args)]
#[group(multiple = false)]
struct IntervalArgs {
    /// Keep every K-th frame.
    #[arg(long, value_name = "K")]
    every_frames: Option<usize>,

    /// Keep one frame per S seconds of video.
    #[arg(long, value_name = "S")]
    every_seconds: Option<f64>,
}

impl IntervalArgs {
    fn interval(&self) -> SamplingInterval {
        match (self.every_frames, self.every_seconds) {
            (Some(k), _) => SamplingInterval::Frames(k),
            (None, Some(s)) => SamplingInterval::Seconds(s),
            (None, None) => SamplingInterval::Seconds(DEFAULT_FRAME_INTERVAL_SECONDS),
        }
    }
}

#[derive(Args)]
struct ExtractArgs {
    /// Video files.
    #[arg(required = true)]
    videos: Vec<PathBuf>,

    /// Output folder; each video gets a `<name>_frames` folder inside it.
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    interval: IntervalArgs,

    /// Image format: jpg or png.
    #[arg(long, default_value = "jpg")]
    format: FrameFormat,

    /// Keep frames in stored orientation instead of applying rotation metadata.
    #[arg(long)]
    no_rotate: bool,

    /// Rotate every frame by a fixed amount (none, cw, ccw, 180) instead of
    /// following rotation metadata.
    #[arg(long, value_name = "ROTATION")]
    rotate: Option<Rotation>,

    /// Extract again into frames folders that already exist.
    #[arg(long)]
    overwrite: bool,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns whether every file succeeded.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Anonymize(args) => run_anonymize(args),
        Command::Extract(args) => run_extract(args),
    }
}

fn run_anonymize(args: AnonymizeArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let config = job_config(&args)?;
    let anonymizer = DefaceAnonymizer::from_command_line(&args.deface, Box::new(FfmpegProbe))
        .ok_or("the deface command is empty")?;

    let executor: Box<dyn BatchExecutor> = if args.jobs > 1 {
        Box::new(ThreadedBatchExecutor::new(args.jobs))
    } else {
        Box::new(SequentialBatchExecutor)
    };
    let inputs = config.inputs.clone();
    let observer = move |event: BatchEvent| match event {
        BatchEvent::FileStarted { index, input } => {
            eprintln!("[{}/{}] {}", index + 1, inputs.len(), input.display());
        }
        BatchEvent::FileProgress {
            index,
            current,
            total,
        } => {
            let name = file_name(&inputs[index]);
            eprint!("\r  {name}: frame {current}/{total}");
        }
        BatchEvent::FileFinished { result, .. } => match result.status {
            JobStatus::Success => eprintln!("\r  done: {}", result.output.display()),
            JobStatus::Failed => eprintln!(
                "\r  failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            ),
            JobStatus::Cancelled => {}
        },
    };

    let use_case = AnonymizeBatchUseCase::new(
        Box::new(anonymizer),
        executor,
        Some(Box::new(FfmpegRemuxer)),
        Some(Box::new(observer)),
        Some(Box::new(StdoutPipelineLogger::default())),
        None,
    );
    let report = use_case.execute(&config);

    if let Some(fatal) = &report.fatal {
        return Err(fatal.clone().into());
    }
    eprintln!("{}", report.summary());
    Ok(report.all_succeeded())
}

fn run_extract(args: ExtractArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = ExtractionConfig::new(args.videos, args.output);
    config.interval = args.interval.interval();
    config.interval.validate()?;
    config.format = args.format;
    config.auto_rotate = !args.no_rotate;
    config.rotation = args.rotate;
    config.overwrite_existing = args.overwrite;

    let observer = |event: ExtractionEvent| match event {
        ExtractionEvent::VideoStarted {
            video,
            estimated_frames,
            ..
        } => eprintln!(
            "{}: about {estimated_frames} frame(s) to save",
            video.display()
        ),
        ExtractionEvent::FrameWritten { written, .. } => eprint!("\r  saved {written}"),
        ExtractionEvent::VideoFinished { result, .. } => match result.status {
            ExtractionStatus::Success => eprintln!(
                "\r  {} frame(s) in {}",
                result.frames_written,
                result.frames_dir.display()
            ),
            ExtractionStatus::Skipped => eprintln!(
                "{}: {} exists, skipped (use --overwrite)",
                result.video.display(),
                result.frames_dir.display()
            ),
            ExtractionStatus::Failed => eprintln!(
                "\r  failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            ),
            ExtractionStatus::Cancelled => {}
        },
    };

    let mut use_case = ExtractFramesUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(ImageFileWriter::new()),
        Some(Box::new(observer)),
        Some(Box::new(StdoutPipelineLogger::default())),
        None,
    );
    let results = use_case.execute_batch(&config);
    Ok(results
        .iter()
        .all(|r| r.status != ExtractionStatus::Failed))
}

fn job_config(args: &AnonymizeArgs) -> Result<JobConfig, Box<dyn std::error::Error>> {
    let mut inputs = Vec::new();
    for path in &args.inputs {
        if path.is_dir() {
            let images = images_in_dir(path)?;
            if images.is_empty() {
                log::warn!("No images found in {}", path.display());
            }
            inputs.extend(images);
        } else {
            inputs.push(path.clone());
        }
    }
    if inputs.is_empty() {
        return Err("no input files to process".into());
    }

    let params = AnonymizationParams {
        method: args.method,
        threshold: args.thresh,
        mask_scale: args.mask_scale,
        downscale: args.downscale,
        box_shape: args.boxes,
        draw_scores: args.draw_scores,
        mosaic_size: args.mosaic_size,
    };
    params.validate()?;

    let mut config = JobConfig::new(inputs, &args.output).with_params(params);
    config.repair_corrupt = args.repair;
    config.output_suffix = args.suffix.clone();
    Ok(config)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
