use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use deface_studio_core::pipeline::batch_events::ExtractionEvent;
use deface_studio_core::pipeline::extract_frames_use_case::ExtractFramesUseCase;
use deface_studio_core::pipeline::extraction_job::{ExtractionConfig, ExtractionResult};
use deface_studio_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use deface_studio_core::video::domain::image_writer::ImageWriter;
use deface_studio_core::video::domain::video_reader::VideoReader;
use deface_studio_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use deface_studio_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Messages sent from the extraction thread to the UI.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Video index and the estimated number of frames it will produce.
    Started(usize, usize),
    /// Video index and frames written so far.
    FrameWritten(usize, usize),
    Finished(usize, ExtractionResult),
    Done(Vec<ExtractionResult>),
}

/// Spawn a background frame extraction. The last message is always
/// [`WorkerMessage::Done`].
pub fn spawn(config: ExtractionConfig) -> (Receiver<WorkerMessage>, Arc<AtomicBool>) {
    spawn_with(
        Box::new(FfmpegReader::new()),
        Box::new(ImageFileWriter::new()),
        config,
    )
}

fn spawn_with(
    reader: Box<dyn VideoReader>,
    writer: Box<dyn ImageWriter>,
    config: ExtractionConfig,
) -> (Receiver<WorkerMessage>, Arc<AtomicBool>) {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    thread::spawn(move || {
        let mut use_case = ExtractFramesUseCase::new(
            reader,
            writer,
            Some(Box::new(forward_events(tx.clone()))),
            Some(Box::new(StdoutPipelineLogger::default())),
            Some(cancelled_clone),
        );
        let results = use_case.execute_batch(&config);
        let _ = tx.send(WorkerMessage::Done(results));
    });

    (rx, cancelled)
}

fn forward_events(tx: Sender<WorkerMessage>) -> impl Fn(ExtractionEvent) + Send + Sync {
    move |event| {
        let message = match event {
            ExtractionEvent::VideoStarted {
                index,
                estimated_frames,
                ..
            } => WorkerMessage::Started(index, estimated_frames),
            ExtractionEvent::FrameWritten { index, written, .. } => {
                WorkerMessage::FrameWritten(index, written)
            }
            ExtractionEvent::VideoFinished { index, result } => {
                WorkerMessage::Finished(index, result)
            }
        };
        let _ = tx.send(message);
    }
}
