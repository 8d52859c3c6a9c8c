use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use deface_studio_core::anonymization::domain::anonymizer::Anonymizer;
use deface_studio_core::anonymization::infrastructure::deface_anonymizer::DefaceAnonymizer;
use deface_studio_core::pipeline::anonymize_batch_use_case::AnonymizeBatchUseCase;
use deface_studio_core::pipeline::batch_events::BatchEvent;
use deface_studio_core::pipeline::batch_executor::BatchExecutor;
use deface_studio_core::pipeline::infrastructure::sequential_batch_executor::SequentialBatchExecutor;
use deface_studio_core::pipeline::infrastructure::threaded_batch_executor::ThreadedBatchExecutor;
use deface_studio_core::pipeline::job::{BatchReport, JobConfig, JobResult};
use deface_studio_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use deface_studio_core::video::infrastructure::ffmpeg_probe::FfmpegProbe;
use deface_studio_core::video::infrastructure::ffmpeg_remuxer::FfmpegRemuxer;

/// Messages sent from the batch thread to the UI.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Started(usize),
    Progress(usize, usize, usize),
    Finished(usize, JobResult),
    Done(BatchReport),
}

pub struct BatchRequest {
    pub config: JobConfig,
    pub deface_command: String,
    pub workers: usize,
}

/// Spawn a background batch. Returns the channel receiver and cancellation
/// token; the last message is always [`WorkerMessage::Done`].
pub fn spawn(request: BatchRequest) -> (Receiver<WorkerMessage>, Arc<AtomicBool>) {
    let cancelled = Arc::new(AtomicBool::new(false));
    let rx = match DefaceAnonymizer::from_command_line(
        &request.deface_command,
        Box::new(FfmpegProbe),
    ) {
        Some(anonymizer) => spawn_with(Box::new(anonymizer), request, cancelled.clone()),
        None => {
            let (tx, rx) = crossbeam_channel::unbounded();
            let report = aborted(&request.config, "The deface command is empty");
            let _ = tx.send(WorkerMessage::Done(report));
            rx
        }
    };
    (rx, cancelled)
}

fn spawn_with(
    anonymizer: Box<dyn Anonymizer>,
    request: BatchRequest,
    cancelled: Arc<AtomicBool>,
) -> Receiver<WorkerMessage> {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();

    thread::spawn(move || {
        let executor: Box<dyn BatchExecutor> = if request.workers > 1 {
            Box::new(ThreadedBatchExecutor::new(request.workers))
        } else {
            Box::new(SequentialBatchExecutor)
        };

        let use_case = AnonymizeBatchUseCase::new(
            anonymizer,
            executor,
            Some(Box::new(FfmpegRemuxer)),
            Some(Box::new(forward_events(tx.clone()))),
            Some(Box::new(StdoutPipelineLogger::default())),
            Some(cancelled),
        );
        let report = use_case.execute(&request.config);
        log::info!("{}", report.summary());
        let _ = tx.send(WorkerMessage::Done(report));
    });

    rx
}

fn forward_events(tx: Sender<WorkerMessage>) -> impl Fn(BatchEvent) + Send + Sync {
    move |event| {
        let message = match event {
            BatchEvent::FileStarted { index, .. } => WorkerMessage::Started(index),
            BatchEvent::FileProgress {
                index,
                current,
                total,
            } => WorkerMessage::Progress(index, current, total),
            BatchEvent::FileFinished { index, result } => WorkerMessage::Finished(index, result),
        };
        let _ = tx.send(message);
    }
}

fn aborted(config: &JobConfig, reason: &str) -> BatchReport {
    BatchReport {
        results: config
            .inputs
            .iter()
            .zip(config.planned_outputs())
            .map(|(input, output)| JobResult::failed(input, output, reason))
            .collect(),
        fatal: Some(reason.to_string()),
    }
}
