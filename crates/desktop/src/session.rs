//! UI-side state of the running jobs, fed by worker messages.
//!
//! Nothing here touches the filesystem or spawns threads, so the state
//! transitions are tested without a window.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use deface_studio_core::pipeline::extraction_job::{ExtractionResult, ExtractionStatus};
use deface_studio_core::pipeline::job::{BatchReport, JobResult, JobStatus};
use deface_studio_core::shared::media_type::MediaType;

use crate::workers::{batch_worker, extract_worker};

const MAX_LOG_LINES: usize = 200;

/// Which batch tab a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Videos,
    Images,
}

impl MediaKind {
    pub fn media_type(self) -> MediaType {
        match self {
            MediaKind::Videos => MediaType::Video,
            MediaKind::Images => MediaType::Image,
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            MediaKind::Videos => "video",
            MediaKind::Images => "image",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileState {
    Pending,
    Running { current: usize, total: usize },
    Done(JobResult),
}

impl FileState {
    pub fn label(&self) -> String {
        match self {
            FileState::Pending => "Waiting".to_string(),
            FileState::Running { current, total } if *total > 0 => {
                format!("{}%", current * 100 / total)
            }
            FileState::Running { .. } => "Running".to_string(),
            FileState::Done(result) => match result.status {
                JobStatus::Success => "Done".to_string(),
                JobStatus::Failed => "Failed".to_string(),
                JobStatus::Cancelled => "Cancelled".to_string(),
            },
        }
    }

    /// Share of this file's work that is finished, `0.0..=1.0`.
    fn fraction(&self) -> f32 {
        match self {
            FileState::Pending => 0.0,
            FileState::Running { current, total } if *total > 0 => {
                (*current as f32 / *total as f32).min(1.0)
            }
            FileState::Running { .. } => 0.0,
            FileState::Done(_) => 1.0,
        }
    }
}

/// Files queued on the Videos or Images tab and the progress of the batch
/// running over them.
#[derive(Debug)]
pub struct BatchSession {
    pub kind: MediaKind,
    pub files: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub states: Vec<FileState>,
    pub running: bool,
    pub stopping: bool,
    pub report: Option<BatchReport>,
    pub log: Vec<String>,
}

impl BatchSession {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            files: Vec::new(),
            output_dir: None,
            states: Vec::new(),
            running: false,
            stopping: false,
            report: None,
            log: Vec::new(),
        }
    }

    /// Queues the paths of this tab's media type that are not queued yet.
    /// Returns how many were added.
    pub fn add_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> usize {
        if self.running {
            return 0;
        }
        let added = add_unique(&mut self.files, paths, self.kind.media_type());
        if added > 0 {
            self.reset_progress();
        }
        if self.output_dir.is_none() {
            self.output_dir = self
                .files
                .first()
                .and_then(|f| default_output_dir(f, "anonymized"));
        }
        added
    }

    pub fn remove_file(&mut self, index: usize) {
        if !self.running && index < self.files.len() {
            self.files.remove(index);
            self.reset_progress();
        }
    }

    /// Moves the file at `index` by `delta` places, stopping at either end
    /// of the queue.
    pub fn move_file(&mut self, index: usize, delta: isize) {
        if self.running || index >= self.files.len() {
            return;
        }
        let target = index
            .saturating_add_signed(delta)
            .min(self.files.len() - 1);
        if target != index {
            let file = self.files.remove(index);
            self.files.insert(target, file);
            self.reset_progress();
        }
    }

    pub fn clear(&mut self) {
        if !self.running {
            self.files.clear();
            self.reset_progress();
            self.log.clear();
        }
    }

    pub fn can_start(&self) -> bool {
        !self.running && !self.files.is_empty() && self.output_dir.is_some()
    }

    pub fn start(&mut self) {
        self.states = vec![FileState::Pending; self.files.len()];
        self.running = true;
        self.stopping = false;
        self.report = None;
        self.push_log(format!(
            "Starting {} {}(s)",
            self.files.len(),
            self.kind.noun()
        ));
    }

    pub fn request_stop(&mut self) {
        if self.running && !self.stopping {
            self.stopping = true;
            self.push_log("Stopping after the current file".to_string());
        }
    }

    pub fn apply(&mut self, message: batch_worker::WorkerMessage) {
        use batch_worker::WorkerMessage;

        match message {
            WorkerMessage::Started(index) => {
                self.set_state(index, FileState::Running { current: 0, total: 0 });
            }
            WorkerMessage::Progress(index, current, total) => {
                self.set_state(index, FileState::Running { current, total });
            }
            WorkerMessage::Finished(index, result) => {
                match result.status {
                    JobStatus::Success => self.push_log(format!(
                        "{} \u{2192} {}",
                        name(&result.input),
                        name(&result.output)
                    )),
                    JobStatus::Failed => self.push_log(format!(
                        "{}: {}",
                        name(&result.input),
                        result.error.as_deref().unwrap_or("failed")
                    )),
                    JobStatus::Cancelled => {}
                }
                self.set_state(index, FileState::Done(result));
            }
            WorkerMessage::Done(report) => {
                for (index, result) in report.results.iter().enumerate() {
                    if !matches!(self.states.get(index), Some(FileState::Done(_))) {
                        self.set_state(index, FileState::Done(result.clone()));
                    }
                }
                self.push_log(report.summary());
                self.report = Some(report);
                self.running = false;
                self.stopping = false;
            }
        }
    }

    /// The worker went away without a final report.
    pub fn worker_lost(&mut self) {
        self.running = false;
        self.stopping = false;
        self.push_log("The batch stopped unexpectedly".to_string());
    }

    /// Overall progress over all files, `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        overall(self.states.iter().map(FileState::fraction), self.states.len())
    }

    pub fn state(&self, index: usize) -> Option<&FileState> {
        self.states.get(index)
    }

    fn set_state(&mut self, index: usize, state: FileState) {
        if let Some(slot) = self.states.get_mut(index) {
            *slot = state;
        }
    }

    fn reset_progress(&mut self) {
        self.states.clear();
        self.report = None;
    }

    fn push_log(&mut self, line: String) {
        push_bounded(&mut self.log, line);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoState {
    Pending,
    Running { written: usize, estimated: usize },
    Done(ExtractionResult),
}

impl VideoState {
    pub fn label(&self) -> String {
        match self {
            VideoState::Pending => "Waiting".to_string(),
            VideoState::Running { written, estimated } if *estimated > 0 => {
                format!("{written} / ~{estimated} frames")
            }
            VideoState::Running { written, .. } => format!("{written} frames"),
            VideoState::Done(result) => match result.status {
                ExtractionStatus::Success => format!("{} frames", result.frames_written),
                ExtractionStatus::Failed => "Failed".to_string(),
                ExtractionStatus::Skipped => "Skipped".to_string(),
                ExtractionStatus::Cancelled => "Cancelled".to_string(),
            },
        }
    }

    fn fraction(&self) -> f32 {
        match self {
            VideoState::Pending => 0.0,
            VideoState::Running { written, estimated } if *estimated > 0 => {
                (*written as f32 / *estimated as f32).min(1.0)
            }
            VideoState::Running { .. } => 0.0,
            VideoState::Done(_) => 1.0,
        }
    }
}

/// Videos queued on the Frames tab.
#[derive(Debug)]
pub struct FramesSession {
    pub videos: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub states: Vec<VideoState>,
    pub running: bool,
    pub results: Option<Vec<ExtractionResult>>,
    pub log: Vec<String>,
}

impl FramesSession {
    pub fn new() -> Self {
        Self {
            videos: Vec::new(),
            output_dir: None,
            states: Vec::new(),
            running: false,
            results: None,
            log: Vec::new(),
        }
    }

    pub fn add_videos(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> usize {
        if self.running {
            return 0;
        }
        let added = add_unique(&mut self.videos, paths, MediaType::Video);
        if added > 0 {
            self.states.clear();
            self.results = None;
        }
        if self.output_dir.is_none() {
            self.output_dir = self
                .videos
                .first()
                .and_then(|v| default_output_dir(v, "frames"));
        }
        added
    }

    pub fn clear(&mut self) {
        if !self.running {
            self.videos.clear();
            self.states.clear();
            self.results = None;
            self.log.clear();
        }
    }

    pub fn can_start(&self) -> bool {
        !self.running && !self.videos.is_empty() && self.output_dir.is_some()
    }

    pub fn start(&mut self) {
        self.states = vec![VideoState::Pending; self.videos.len()];
        self.running = true;
        self.results = None;
    }

    pub fn apply(&mut self, message: extract_worker::WorkerMessage) {
        use extract_worker::WorkerMessage;

        match message {
            WorkerMessage::Started(index, estimated) => {
                self.set_state(
                    index,
                    VideoState::Running {
                        written: 0,
                        estimated,
                    },
                );
            }
            WorkerMessage::FrameWritten(index, written) => {
                let estimated = match self.states.get(index) {
                    Some(VideoState::Running { estimated, .. }) => *estimated,
                    _ => 0,
                };
                self.set_state(index, VideoState::Running { written, estimated });
            }
            WorkerMessage::Finished(index, result) => {
                let line = match result.status {
                    ExtractionStatus::Success => format!(
                        "{}: {} frame(s) in {}",
                        name(&result.video),
                        result.frames_written,
                        result.frames_dir.display()
                    ),
                    ExtractionStatus::Skipped => format!(
                        "{}: {} already exists, skipped",
                        name(&result.video),
                        result.frames_dir.display()
                    ),
                    ExtractionStatus::Failed => format!(
                        "{}: {}",
                        name(&result.video),
                        result.error.as_deref().unwrap_or("failed")
                    ),
                    ExtractionStatus::Cancelled => {
                        format!("{}: cancelled", name(&result.video))
                    }
                };
                push_bounded(&mut self.log, line);
                self.set_state(index, VideoState::Done(result));
            }
            WorkerMessage::Done(results) => {
                let written: usize = results.iter().map(|r| r.frames_written).sum();
                push_bounded(
                    &mut self.log,
                    format!("Saved {written} frame(s) from {} video(s)", results.len()),
                );
                self.results = Some(results);
                self.running = false;
            }
        }
    }

    pub fn worker_lost(&mut self) {
        self.running = false;
        push_bounded(&mut self.log, "Frame extraction stopped unexpectedly".to_string());
    }

    pub fn progress(&self) -> f32 {
        overall(self.states.iter().map(VideoState::fraction), self.states.len())
    }

    pub fn state(&self, index: usize) -> Option<&VideoState> {
        self.states.get(index)
    }

    fn set_state(&mut self, index: usize, state: VideoState) {
        if let Some(slot) = self.states.get_mut(index) {
            *slot = state;
        }
    }
}

impl Default for FramesSession {
    fn default() -> Self {
        Self::new()
    }
}

fn add_unique(
    list: &mut Vec<PathBuf>,
    paths: impl IntoIterator<Item = PathBuf>,
    kind: MediaType,
) -> usize {
    let mut seen: HashSet<PathBuf> = list.iter().cloned().collect();
    let before = list.len();
    for path in paths {
        if MediaType::from_path(&path) == kind && seen.insert(path.clone()) {
            list.push(path);
        }
    }
    list.len() - before
}

/// Suggested output folder: `folder` next to the first input.
fn default_output_dir(first: &Path, folder: &str) -> Option<PathBuf> {
    first.parent().map(|p| p.join(folder))
}

fn overall(fractions: impl Iterator<Item = f32>, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    fractions.sum::<f32>() / count as f32
}

fn push_bounded(log: &mut Vec<String>, line: String) {
    log.push(line);
    if log.len() > MAX_LOG_LINES {
        let excess = log.len() - MAX_LOG_LINES;
        log.drain(..excess);
    }
}

fn name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use batch_worker::WorkerMessage as Batch;
    use extract_worker::WorkerMessage as Extract;

    fn videos(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/media").join(n)).collect()
    }

    #[test]
    fn test_add_files_filters_by_kind_and_skips_duplicates() {
        let mut session = BatchSession::new(MediaKind::Videos);
        assert_eq!(session.add_files(videos(&["a.mp4", "b.jpg", "c.mov"])), 2);
        assert_eq!(session.add_files(videos(&["a.mp4", "d.mkv"])), 1);
        assert_eq!(session.files, videos(&["a.mp4", "c.mov", "d.mkv"]));
        assert_eq!(session.output_dir, Some(PathBuf::from("/media/anonymized")));
    }

    #[test]
    fn test_images_tab_only_takes_images() {
        let mut session = BatchSession::new(MediaKind::Images);
        assert_eq!(session.add_files(videos(&["a.mp4", "b.jpg", "c.PNG"])), 2);
    }

    #[test]
    fn test_cannot_start_without_output_or_files() {
        let mut session = BatchSession::new(MediaKind::Videos);
        assert!(!session.can_start());
        session.add_files(videos(&["a.mp4"]));
        assert!(session.can_start());
        session.output_dir = None;
        assert!(!session.can_start());
    }

    #[test]
    fn test_batch_messages_drive_states_and_progress() {
        let mut session = BatchSession::new(MediaKind::Videos);
        session.add_files(videos(&["a.mp4", "b.mp4"]));
        session.start();
        assert!(session.running);
        assert_abs_diff_eq!(session.progress(), 0.0);

        session.apply(Batch::Started(0));
        session.apply(Batch::Progress(0, 50, 100));
        assert_eq!(session.state(0).unwrap().label(), "50%");
        assert_abs_diff_eq!(session.progress(), 0.25);

        let done = JobResult::success("/media/a.mp4", "/media/anonymized/a_anonymized.mp4");
        session.apply(Batch::Finished(0, done.clone()));
        let failed = JobResult::failed("/media/b.mp4", "/out/b.mp4", "moov atom not found");
        session.apply(Batch::Finished(1, failed.clone()));
        assert_abs_diff_eq!(session.progress(), 1.0);

        session.apply(Batch::Done(BatchReport {
            results: vec![done, failed],
            fatal: None,
        }));
        assert!(!session.running);
        assert_eq!(session.state(1).unwrap().label(), "Failed");
        assert!(session.log.iter().any(|l| l.contains("moov atom not found")));
        assert_eq!(
            session.log.last().unwrap(),
            "1 of 2 file(s) anonymized, 1 failed"
        );
    }

    #[test]
    fn test_done_fills_in_files_without_events() {
        let mut session = BatchSession::new(MediaKind::Images);
        session.add_files(videos(&["a.jpg", "b.jpg"]));
        session.start();

        let results = vec![
            JobResult::failed("/media/a.jpg", "/o/a.jpg", "deface not found"),
            JobResult::failed("/media/b.jpg", "/o/b.jpg", "deface not found"),
        ];
        session.apply(Batch::Done(BatchReport {
            results,
            fatal: Some("deface not found".to_string()),
        }));

        assert!(session
            .states
            .iter()
            .all(|s| matches!(s, FileState::Done(r) if r.status == JobStatus::Failed)));
        assert_eq!(session.log.last().unwrap(), "Batch aborted: deface not found");
    }

    #[test]
    fn test_move_file_reorders_queue() {
        let mut session = BatchSession::new(MediaKind::Videos);
        session.add_files(videos(&["a.mp4", "b.mp4", "c.mp4"]));
        let names = |s: &BatchSession| -> Vec<String> {
            s.files
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };

        session.move_file(2, -1);
        assert_eq!(names(&session), vec!["a.mp4", "c.mp4", "b.mp4"]);
        session.move_file(0, 1);
        assert_eq!(names(&session), vec!["c.mp4", "a.mp4", "b.mp4"]);

        // Ends of the queue and stale indices leave it unchanged.
        session.move_file(0, -1);
        session.move_file(2, 1);
        session.move_file(7, -1);
        assert_eq!(names(&session), vec!["c.mp4", "a.mp4", "b.mp4"]);

        session.start();
        session.move_file(1, -1);
        assert_eq!(names(&session), vec!["c.mp4", "a.mp4", "b.mp4"]);
    }

    #[test]
    fn test_files_are_locked_while_running() {
        let mut session = BatchSession::new(MediaKind::Videos);
        session.add_files(videos(&["a.mp4"]));
        session.start();

        assert_eq!(session.add_files(videos(&["b.mp4"])), 0);
        session.remove_file(0);
        session.clear();
        assert_eq!(session.files.len(), 1);

        session.request_stop();
        assert!(session.stopping);
    }

    #[test]
    fn test_frames_session_tracks_written_frames() {
        let mut session = FramesSession::new();
        session.add_videos(videos(&["clip.mp4", "photo.jpg"]));
        assert_eq!(session.videos.len(), 1);
        session.start();

        session.apply(Extract::Started(0, 4));
        session.apply(Extract::FrameWritten(0, 2));
        assert_eq!(session.state(0).unwrap().label(), "2 / ~4 frames");
        assert_abs_diff_eq!(session.progress(), 0.5);

        let result = ExtractionResult {
            video: PathBuf::from("/media/clip.mp4"),
            frames_dir: PathBuf::from("/media/anonymized/clip_frames"),
            frames_written: 4,
            status: ExtractionStatus::Success,
            error: None,
        };
        session.apply(Extract::Finished(0, result.clone()));
        session.apply(Extract::Done(vec![result]));

        assert!(!session.running);
        assert_eq!(session.state(0).unwrap().label(), "4 frames");
        assert_eq!(
            session.log.last().unwrap(),
            "Saved 4 frame(s) from 1 video(s)"
        );
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = Vec::new();
        for i in 0..MAX_LOG_LINES + 5 {
            push_bounded(&mut log, i.to_string());
        }
        assert_eq!(log.len(), MAX_LOG_LINES);
        assert_eq!(log[0], "5");
    }
}
