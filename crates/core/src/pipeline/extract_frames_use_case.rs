use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::shared::video_metadata::Rotation;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

use super::batch_events::{ExtractionEvent, ExtractionObserver};
use super::extract_error::ExtractError;
use super::extraction_job::{
    frame_file_name, is_frame_file_of, ExtractionConfig, ExtractionResult, ExtractionStatus,
    SamplingInterval,
};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// What a single video produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extracted {
    pub frames_written: usize,
    /// Stopped early by the cancel flag.
    pub cancelled: bool,
}

/// Samples frames out of videos and saves them as numbered images.
///
/// Frames are pulled lazily from the reader; frame `i` of the decode order
/// is kept when `i` is a multiple of the interval's frame step, so a video
/// of `F` frames yields `ceil(F / k)` images.
pub struct ExtractFramesUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn ImageWriter>,
    observer: Option<Box<dyn ExtractionObserver>>,
    logger: Box<dyn PipelineLogger>,
    cancelled: Arc<AtomicBool>,
}

impl ExtractFramesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn ImageWriter>,
        observer: Option<Box<dyn ExtractionObserver>>,
        logger: Option<Box<dyn PipelineLogger>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader,
            writer,
            observer,
            logger: logger.unwrap_or_else(|| Box::new(NullPipelineLogger)),
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Extracts one video into `frames_dir`, using the interval, format and
    /// rotation settings of `config` (its video list is ignored).
    pub fn execute(
        &mut self,
        video: &Path,
        frames_dir: &Path,
        config: &ExtractionConfig,
    ) -> Result<Extracted, ExtractError> {
        self.extract(0, video, frames_dir, config)
    }

    /// Extracts every video of `config` into its own frames folder.
    ///
    /// Returns one result per video in input order. A failing video does not
    /// stop the others; an existing folder is skipped unless
    /// `overwrite_existing` is set.
    pub fn execute_batch(&mut self, config: &ExtractionConfig) -> Vec<ExtractionResult> {
        let frames_dirs = config.planned_frames_dirs();
        let total = config.videos.len();
        self.logger.info(&format!(
            "Extracting frames from {total} video(s) {} as {}",
            config.interval, config.format
        ));

        let mut results = Vec::with_capacity(total);
        for (index, (video, frames_dir)) in config.videos.iter().zip(frames_dirs).enumerate() {
            let mut result = ExtractionResult {
                video: video.clone(),
                frames_dir: frames_dir.clone(),
                frames_written: 0,
                status: ExtractionStatus::Success,
                error: None,
            };

            if self.cancelled.load(Ordering::Relaxed) {
                result.status = ExtractionStatus::Cancelled;
            } else if frames_dir.exists() && !config.overwrite_existing {
                self.logger.info(&format!(
                    "Folder {} already exists, skipping {}",
                    frames_dir.display(),
                    video.display()
                ));
                result.status = ExtractionStatus::Skipped;
            } else {
                let started = Instant::now();
                match self.extract(index, video, &frames_dir, config) {
                    Ok(extracted) => {
                        result.frames_written = extracted.frames_written;
                        if extracted.cancelled {
                            result.status = ExtractionStatus::Cancelled;
                        }
                        self.logger.info(&format!(
                            "Extracted {} frame(s) from {}",
                            extracted.frames_written,
                            video.display()
                        ));
                    }
                    Err(e) => {
                        warn!("Frame extraction failed for {}: {e}", video.display());
                        result.status = ExtractionStatus::Failed;
                        result.error = Some(e.to_string());
                    }
                }
                self.logger
                    .timing("extract", started.elapsed().as_secs_f64() * 1000.0);
                self.logger
                    .metric("frames_written", result.frames_written as f64);
            }

            self.logger.progress(index + 1, total);
            if let Some(observer) = &self.observer {
                observer.on_event(ExtractionEvent::VideoFinished {
                    index,
                    result: result.clone(),
                });
            }
            results.push(result);
        }

        self.logger.summary();
        results
    }

    fn extract(
        &mut self,
        index: usize,
        video: &Path,
        frames_dir: &Path,
        config: &ExtractionConfig,
    ) -> Result<Extracted, ExtractError> {
        config
            .interval
            .validate()
            .map_err(ExtractError::InvalidInterval)?;

        let metadata = self.reader.open(video).map_err(|e| ExtractError::Open {
            path: video.to_path_buf(),
            message: e.to_string(),
        })?;

        if matches!(config.interval, SamplingInterval::Seconds(_)) && metadata.fps <= 0.0 {
            warn!(
                "{} reports no frame rate; keeping every frame",
                video.display()
            );
        }
        let step = config.interval.frame_step(metadata.fps);
        let rotation = config.rotation_for(metadata.rotation);
        if rotation != Rotation::None {
            info!(
                "Rotating frames of {} by {} degrees",
                video.display(),
                rotation.degrees()
            );
        }

        let result = std::fs::create_dir_all(frames_dir)
            .and_then(|()| remove_previous_frames(video, frames_dir))
            .map_err(|e| ExtractError::Write {
                path: frames_dir.to_path_buf(),
                message: e.to_string(),
            })
            .and_then(|()| {
                if let Some(observer) = &self.observer {
                    observer.on_event(ExtractionEvent::VideoStarted {
                        index,
                        video: video.to_path_buf(),
                        estimated_frames: metadata.total_frames.div_ceil(step),
                    });
                }
                self.write_sampled(index, video, frames_dir, config, step, rotation)
            });

        self.reader.close();
        result
    }

    fn write_sampled(
        &mut self,
        index: usize,
        video: &Path,
        frames_dir: &Path,
        config: &ExtractionConfig,
        step: usize,
        rotation: Rotation,
    ) -> Result<Extracted, ExtractError> {
        let Self {
            reader,
            writer,
            observer,
            cancelled,
            ..
        } = self;

        let mut written = 0;
        for (decoded, frame) in reader.frames().enumerate() {
            if cancelled.load(Ordering::Relaxed) {
                return Ok(Extracted {
                    frames_written: written,
                    cancelled: true,
                });
            }

            let frame = frame.map_err(|e| ExtractError::Decode {
                path: video.to_path_buf(),
                frame: decoded,
                message: e.to_string(),
            })?;
            if decoded % step != 0 {
                continue;
            }

            let path = frames_dir.join(frame_file_name(video, written, config.format));
            writer
                .write(&path, &frame, rotation)
                .map_err(|e| ExtractError::Write {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            written += 1;

            if let Some(observer) = observer.as_ref() {
                observer.on_event(ExtractionEvent::FrameWritten {
                    index,
                    path,
                    written,
                    decoded: decoded + 1,
                });
            }
        }

        Ok(Extracted {
            frames_written: written,
            cancelled: false,
        })
    }
}

/// Deletes frames an earlier extraction of `video` left in `frames_dir`, so
/// the folder ends up holding only this run's sequence.
fn remove_previous_frames(video: &Path, frames_dir: &Path) -> std::io::Result<()> {
    let mut removed = 0;
    for entry in std::fs::read_dir(frames_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if entry.file_type()?.is_file() && is_frame_file_of(video, &name.to_string_lossy()) {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    if removed > 0 {
        info!(
            "Removed {removed} frame(s) of an earlier extraction from {}",
            frames_dir.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction_job::FrameFormat;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
    use crate::video::infrastructure::image_file_writer::ImageFileWriter;
    use crate::video::test_video::write_test_video;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // --- Stubs ---

    struct StubReader {
        frame_count: usize,
        fps: f64,
        rotation: Rotation,
        fail_at: Option<usize>,
        closed: Arc<Mutex<usize>>,
    }

    impl StubReader {
        fn new(frame_count: usize, fps: f64) -> Self {
            Self {
                frame_count,
                fps,
                rotation: Rotation::None,
                fail_at: None,
                closed: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if path.to_string_lossy().contains("missing") {
                return Err("No such file or directory".into());
            }
            Ok(VideoMetadata {
                width: 4,
                height: 2,
                fps: self.fps,
                total_frames: self.frame_count,
                codec: "stub".to_string(),
                source_path: Some(path.to_path_buf()),
                rotation: self.rotation,
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let fail_at = self.fail_at;
            Box::new(
                (0..self.frame_count).map(move |i| -> Result<Frame, Box<dyn std::error::Error>> {
                    if Some(i) == fail_at {
                        Err("corrupt packet".into())
                    } else {
                        Ok(Frame::new(vec![0; 4 * 2 * 3], 4, 2, i))
                    }
                }),
            )
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() += 1;
        }
    }

    #[derive(Clone, Default)]
    struct RecordingWriter {
        written: Arc<Mutex<Vec<(PathBuf, usize, Rotation)>>>,
    }

    impl ImageWriter for RecordingWriter {
        fn write(
            &self,
            path: &Path,
            frame: &Frame,
            rotation: Rotation,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.index(), rotation));
            Ok(())
        }
    }

    /// Writes a marker file per frame.
    struct FileWriter;

    impl ImageWriter for FileWriter {
        fn write(
            &self,
            path: &Path,
            _frame: &Frame,
            _rotation: Rotation,
        ) -> Result<(), Box<dyn std::error::Error>> {
            std::fs::write(path, b"new")?;
            Ok(())
        }
    }

    fn use_case(reader: StubReader, writer: RecordingWriter) -> ExtractFramesUseCase {
        ExtractFramesUseCase::new(Box::new(reader), Box::new(writer), None, None, None)
    }

    fn config(interval: SamplingInterval) -> ExtractionConfig {
        let mut cfg = ExtractionConfig::new(vec![], "/out");
        cfg.interval = interval;
        cfg
    }

    // --- Tests ---

    #[test]
    fn test_keeps_every_kth_frame_with_sequential_names() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RecordingWriter::default();
        let mut uc = use_case(StubReader::new(10, 30.0), writer.clone());

        let extracted = uc
            .execute(
                Path::new("/v/clip.mp4"),
                dir.path(),
                &config(SamplingInterval::Frames(3)),
            )
            .unwrap();

        assert_eq!(extracted.frames_written, 4);
        let written = writer.written.lock().unwrap();
        let indices: Vec<usize> = written.iter().map(|(_, i, _)| *i).collect();
        assert_eq!(indices, vec![0, 3, 6, 9]);
        let names: Vec<String> = written
            .iter()
            .map(|(p, _, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "clip_frame_00000.jpg",
                "clip_frame_00001.jpg",
                "clip_frame_00002.jpg",
                "clip_frame_00003.jpg"
            ]
        );
    }

    #[test]
    fn test_file_count_is_ceil_of_frames_over_step() {
        for (frames, step) in [(10, 1), (10, 2), (10, 3), (9, 3), (1, 5), (0, 4), (7, 10)] {
            let dir = tempfile::tempdir().unwrap();
            let mut uc = use_case(StubReader::new(frames, 30.0), RecordingWriter::default());
            let extracted = uc
                .execute(
                    Path::new("clip.mp4"),
                    dir.path(),
                    &config(SamplingInterval::Frames(step)),
                )
                .unwrap();
            assert_eq!(
                extracted.frames_written,
                frames.div_ceil(step),
                "{frames} frames at step {step}"
            );
        }
    }

    #[test]
    fn test_seconds_interval_uses_frame_rate() {
        let dir = tempfile::tempdir().unwrap();
        let mut uc = use_case(StubReader::new(25, 10.0), RecordingWriter::default());
        let extracted = uc
            .execute(
                Path::new("clip.mp4"),
                dir.path(),
                &config(SamplingInterval::Seconds(0.5)),
            )
            .unwrap();
        // k = 5
        assert_eq!(extracted.frames_written, 5);
    }

    #[test]
    fn test_seconds_interval_without_frame_rate_keeps_all() {
        let dir = tempfile::tempdir().unwrap();
        let mut uc = use_case(StubReader::new(4, 0.0), RecordingWriter::default());
        let extracted = uc
            .execute(
                Path::new("clip.mp4"),
                dir.path(),
                &config(SamplingInterval::Seconds(1.0)),
            )
            .unwrap();
        assert_eq!(extracted.frames_written, 4);
    }

    #[test]
    fn test_rotation_follows_auto_rotate() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = StubReader::new(1, 30.0);
        reader.rotation = Rotation::Cw90;
        let writer = RecordingWriter::default();
        let mut uc = use_case(reader, writer.clone());

        let mut cfg = config(SamplingInterval::Frames(1));
        uc.execute(Path::new("a.mp4"), dir.path(), &cfg).unwrap();
        cfg.auto_rotate = false;
        uc.execute(Path::new("b.mp4"), dir.path(), &cfg).unwrap();
        cfg.rotation = Some(Rotation::Cw270);
        uc.execute(Path::new("c.mp4"), dir.path(), &cfg).unwrap();

        let rotations: Vec<Rotation> = writer.written.lock().unwrap().iter().map(|w| w.2).collect();
        assert_eq!(rotations, vec![Rotation::Cw90, Rotation::None, Rotation::Cw270]);
    }

    #[test]
    fn test_unopenable_video_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut uc = use_case(StubReader::new(3, 30.0), RecordingWriter::default());
        let err = uc
            .execute(
                Path::new("/v/missing.mp4"),
                dir.path(),
                &config(SamplingInterval::Frames(1)),
            )
            .unwrap_err();
        assert!(matches!(err, ExtractError::Open { .. }));
        assert!(err.to_string().contains("cannot open video /v/missing.mp4"));
    }

    #[test]
    fn test_decode_error_names_frame_and_closes_reader() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = StubReader::new(5, 30.0);
        reader.fail_at = Some(2);
        let closed = reader.closed.clone();
        let mut uc = use_case(reader, RecordingWriter::default());

        let err = uc
            .execute(
                Path::new("clip.mp4"),
                dir.path(),
                &config(SamplingInterval::Frames(1)),
            )
            .unwrap_err();

        assert!(matches!(err, ExtractError::Decode { frame: 2, .. }));
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[test]
    fn test_invalid_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut uc = use_case(StubReader::new(3, 30.0), RecordingWriter::default());
        let err = uc
            .execute(
                Path::new("clip.mp4"),
                dir.path(),
                &config(SamplingInterval::Frames(0)),
            )
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidInterval(_)));
    }

    #[test]
    fn test_batch_skips_existing_folder_and_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("done_frames")).unwrap();
        let mut cfg = ExtractionConfig::new(
            vec![
                PathBuf::from("/v/done.mp4"),
                PathBuf::from("/v/missing.mp4"),
                PathBuf::from("/v/new.mp4"),
            ],
            dir.path(),
        );
        cfg.interval = SamplingInterval::Frames(2);
        let mut uc = use_case(StubReader::new(4, 30.0), RecordingWriter::default());

        let results = uc.execute_batch(&cfg);

        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ExtractionStatus::Skipped,
                ExtractionStatus::Failed,
                ExtractionStatus::Success
            ]
        );
        assert_eq!(results[2].frames_written, 2);
        assert_eq!(results[2].frames_dir, dir.path().join("new_frames"));
        assert!(results[1].error.as_deref().unwrap().contains("missing.mp4"));
    }

    #[test]
    fn test_batch_overwrite_replaces_earlier_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames_dir = dir.path().join("done_frames");
        std::fs::create_dir_all(&frames_dir).unwrap();
        // Left by an earlier, denser extraction.
        for seq in 0..6 {
            std::fs::write(frames_dir.join(format!("done_frame_{seq:05}.jpg")), b"old").unwrap();
        }
        std::fs::write(frames_dir.join("done_frame_00000.png"), b"old").unwrap();
        std::fs::write(frames_dir.join("notes.txt"), b"keep me").unwrap();

        let mut cfg = ExtractionConfig::new(vec![PathBuf::from("/v/done.mp4")], dir.path());
        cfg.interval = SamplingInterval::Frames(1);
        cfg.overwrite_existing = true;
        let mut uc = ExtractFramesUseCase::new(
            Box::new(StubReader::new(3, 30.0)),
            Box::new(FileWriter),
            None,
            None,
            None,
        );

        let results = uc.execute_batch(&cfg);

        assert_eq!(results[0].status, ExtractionStatus::Success);
        assert_eq!(results[0].frames_written, 3);
        let mut names: Vec<String> = std::fs::read_dir(&frames_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "done_frame_00000.jpg",
                "done_frame_00001.jpg",
                "done_frame_00002.jpg",
                "notes.txt"
            ]
        );
        let first = std::fs::read(frames_dir.join("done_frame_00000.jpg")).unwrap();
        assert_eq!(first, b"new");
    }

    #[test]
    fn test_cancel_stops_between_frames() {
        let dir = tempfile::tempdir().unwrap();
        let flag = Arc::new(AtomicBool::new(false));
        let trip = flag.clone();
        let observer = move |event: ExtractionEvent| {
            if let ExtractionEvent::FrameWritten { written: 2, .. } = event {
                trip.store(true, Ordering::SeqCst);
            }
        };
        let mut uc = ExtractFramesUseCase::new(
            Box::new(StubReader::new(10, 30.0)),
            Box::new(RecordingWriter::default()),
            Some(Box::new(observer)),
            None,
            Some(flag),
        );
        let mut cfg = ExtractionConfig::new(
            vec![PathBuf::from("/v/a.mp4"), PathBuf::from("/v/b.mp4")],
            dir.path(),
        );
        cfg.interval = SamplingInterval::Frames(1);

        let results = uc.execute_batch(&cfg);

        assert_eq!(results[0].status, ExtractionStatus::Cancelled);
        assert_eq!(results[0].frames_written, 2);
        assert_eq!(results[1].status, ExtractionStatus::Cancelled);
        assert_eq!(results[1].frames_written, 0);
    }

    #[test]
    fn test_events_report_estimate_and_progress() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut uc = ExtractFramesUseCase::new(
            Box::new(StubReader::new(6, 30.0)),
            Box::new(RecordingWriter::default()),
            Some(Box::new(move |e: ExtractionEvent| sink.lock().unwrap().push(e))),
            None,
            None,
        );
        let mut cfg = ExtractionConfig::new(vec![PathBuf::from("/v/a.mp4")], dir.path());
        cfg.interval = SamplingInterval::Frames(4);

        uc.execute_batch(&cfg);

        let events = events.lock().unwrap();
        assert_eq!(
            events[0],
            ExtractionEvent::VideoStarted {
                index: 0,
                video: PathBuf::from("/v/a.mp4"),
                estimated_frames: 2,
            }
        );
        assert!(matches!(
            events[2],
            ExtractionEvent::FrameWritten {
                written: 2,
                decoded: 5,
                ..
            }
        ));
        assert!(matches!(
            &events[3],
            ExtractionEvent::VideoFinished { result, .. } if result.frames_written == 2
        ));
    }

    #[test]
    fn test_real_video_to_png_files() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("street.mp4");
        write_test_video(&video, 10, 64, 48, 30);

        let mut cfg = ExtractionConfig::new(vec![video.clone()], dir.path().join("out"));
        cfg.interval = SamplingInterval::Frames(3);
        cfg.format = FrameFormat::Png;
        let mut uc = ExtractFramesUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(ImageFileWriter::new()),
            None,
            None,
            None,
        );

        let results = uc.execute_batch(&cfg);

        assert_eq!(results[0].status, ExtractionStatus::Success);
        let frames_dir = dir.path().join("out").join("street_frames");
        let mut names: Vec<String> = std::fs::read_dir(&frames_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "street_frame_00000.png",
                "street_frame_00001.png",
                "street_frame_00002.png",
                "street_frame_00003.png"
            ]
        );
        let first = image::open(frames_dir.join("street_frame_00000.png")).unwrap();
        assert_eq!((first.width(), first.height()), (64, 48));
    }
}
