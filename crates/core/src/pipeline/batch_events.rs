use std::path::PathBuf;

use super::extraction_job::ExtractionResult;
use super::job::JobResult;

/// Per-file notifications emitted while a batch runs. `index` is the file's
/// position in the job's input list.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    FileStarted {
        index: usize,
        input: PathBuf,
    },
    /// Frames processed so far for a video (images report 1/1).
    FileProgress {
        index: usize,
        current: usize,
        total: usize,
    },
    FileFinished {
        index: usize,
        result: JobResult,
    },
}

/// Receives [`BatchEvent`]s. Called from worker threads, possibly several at
/// once when the batch runs in parallel.
pub trait BatchObserver: Send + Sync {
    fn on_event(&self, event: BatchEvent);
}

impl<F> BatchObserver for F
where
    F: Fn(BatchEvent) + Send + Sync,
{
    fn on_event(&self, event: BatchEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    VideoStarted {
        index: usize,
        video: PathBuf,
        /// Best estimate from container metadata; 0 when unknown.
        estimated_frames: usize,
    },
    FrameWritten {
        index: usize,
        path: PathBuf,
        written: usize,
        decoded: usize,
    },
    VideoFinished {
        index: usize,
        result: ExtractionResult,
    },
}

pub trait ExtractionObserver: Send + Sync {
    fn on_event(&self, event: ExtractionEvent);
}

impl<F> ExtractionObserver for F
where
    F: Fn(ExtractionEvent) + Send + Sync,
{
    fn on_event(&self, event: ExtractionEvent) {
        self(event)
    }
}
