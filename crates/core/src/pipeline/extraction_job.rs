use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_FRAME_INTERVAL_SECONDS, FRAMES_DIR_SUFFIX};
use crate::shared::video_metadata::Rotation;

/// How often a frame is kept during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "unit", content = "value")]
pub enum SamplingInterval {
    /// Keep every k-th decoded frame.
    Frames(usize),
    /// Keep one frame per this many seconds of video.
    Seconds(f64),
}

impl Default for SamplingInterval {
    fn default() -> Self {
        SamplingInterval::Seconds(DEFAULT_FRAME_INTERVAL_SECONDS)
    }
}

impl SamplingInterval {
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            SamplingInterval::Frames(0) => Err("Frame interval must be at least 1".to_string()),
            SamplingInterval::Seconds(s) if !(s.is_finite() && s > 0.0) => {
                Err(format!("Time interval must be a positive number of seconds, got {s}"))
            }
            _ => Ok(()),
        }
    }

    /// Frame step `k` for a video running at `fps`. Never below 1; a time
    /// interval on a video without a usable frame rate keeps every frame.
    pub fn frame_step(&self, fps: f64) -> usize {
        match *self {
            SamplingInterval::Frames(k) => k.max(1),
            SamplingInterval::Seconds(s) if fps > 0.0 && s.is_finite() => {
                ((s * fps).round() as usize).max(1)
            }
            SamplingInterval::Seconds(_) => 1,
        }
    }
}

impl fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingInterval::Frames(1) => write!(f, "every frame"),
            SamplingInterval::Frames(k) => write!(f, "every {k} frames"),
            SamplingInterval::Seconds(s) => write!(f, "every {s}s"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    #[default]
    Jpg,
    Png,
}

impl FrameFormat {
    pub const ALL: &[FrameFormat] = &[FrameFormat::Jpg, FrameFormat::Png];

    pub fn extension(self) -> &'static str {
        match self {
            FrameFormat::Jpg => "jpg",
            FrameFormat::Png => "png",
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameFormat::Jpg => write!(f, "JPEG"),
            FrameFormat::Png => write!(f, "PNG"),
        }
    }
}

impl std::str::FromStr for FrameFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(FrameFormat::Jpg),
            "png" => Ok(FrameFormat::Png),
            other => Err(format!("unknown frame format '{other}' (expected jpg or png)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub videos: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub interval: SamplingInterval,
    pub format: FrameFormat,
    /// Turn frames upright using the stream's rotation metadata.
    pub auto_rotate: bool,
    /// Fixed rotation for every frame. Takes precedence over `auto_rotate`.
    pub rotation: Option<Rotation>,
    /// Extract into a video's frames folder even if it already exists.
    pub overwrite_existing: bool,
}

impl ExtractionConfig {
    pub fn new(videos: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            videos,
            output_dir: output_dir.into(),
            interval: SamplingInterval::default(),
            format: FrameFormat::default(),
            auto_rotate: true,
            rotation: None,
            overwrite_existing: false,
        }
    }

    /// Rotation applied to frames of a video whose metadata asks for
    /// `detected`.
    pub fn rotation_for(&self, detected: Rotation) -> Rotation {
        match self.rotation {
            Some(fixed) => fixed,
            None if self.auto_rotate => detected,
            None => Rotation::None,
        }
    }

    /// `{output_dir}/{stem}_frames`
    pub fn frames_dir_for(&self, video: &Path) -> PathBuf {
        self.output_dir
            .join(format!("{}{FRAMES_DIR_SUFFIX}", file_stem(video)))
    }

    /// Frames folder for every video, in order. Videos sharing a file stem
    /// get `_2`, `_3`, ... appended so they do not land in one folder.
    pub fn planned_frames_dirs(&self) -> Vec<PathBuf> {
        let mut taken = HashSet::new();
        self.videos
            .iter()
            .map(|video| {
                let base = self.frames_dir_for(video);
                let mut candidate = base.clone();
                let mut counter = 2;
                while !taken.insert(candidate.clone()) {
                    let mut name = base.as_os_str().to_os_string();
                    name.push(format!("_{counter}"));
                    candidate = PathBuf::from(name);
                    counter += 1;
                }
                candidate
            })
            .collect()
    }
}

/// `{stem}_frame_{seq:05}.{ext}`; `seq` counts written frames from zero.
pub fn frame_file_name(video: &Path, seq: usize, format: FrameFormat) -> String {
    format!("{}_frame_{seq:05}.{}", file_stem(video), format.extension())
}

/// True for names `frame_file_name` produces for `video`, in any format.
pub fn is_frame_file_of(video: &Path, name: &str) -> bool {
    let Some(rest) = name.strip_prefix(&format!("{}_frame_", file_stem(video))) else {
        return false;
    };
    let Some((seq, ext)) = rest.rsplit_once('.') else {
        return false;
    };
    !seq.is_empty()
        && seq.bytes().all(|b| b.is_ascii_digit())
        && FrameFormat::ALL.iter().any(|f| f.extension() == ext)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStatus {
    Success,
    Failed,
    /// The frames folder already existed and overwriting was off.
    Skipped,
    /// Stopped by the user; frames written so far are kept.
    Cancelled,
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStatus::Success => write!(f, "success"),
            ExtractionStatus::Failed => write!(f, "failed"),
            ExtractionStatus::Skipped => write!(f, "skipped"),
            ExtractionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub video: PathBuf,
    pub frames_dir: PathBuf,
    pub frames_written: usize,
    pub status: ExtractionStatus,
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExtractionStatus::Success
    }
}
