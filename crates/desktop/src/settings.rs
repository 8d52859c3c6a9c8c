use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use deface_studio_core::anonymization::domain::anonymization_params::AnonymizationParams;
use deface_studio_core::pipeline::extraction_job::{FrameFormat, SamplingInterval};
use deface_studio_core::shared::constants::{DEFACE_PROGRAM, DEFAULT_OUTPUT_SUFFIX};
use deface_studio_core::shared::video_metadata::Rotation;

pub const MAX_WORKERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    Light,
}

impl Appearance {
    pub const ALL: &[Appearance] = &[Appearance::System, Appearance::Dark, Appearance::Light];
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Appearance::System => write!(f, "System"),
            Appearance::Dark => write!(f, "Dark"),
            Appearance::Light => write!(f, "Light"),
        }
    }
}

/// Defaults for new jobs plus UI preferences. Missing fields in an older
/// settings file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub params: AnonymizationParams,
    pub repair_corrupt: bool,
    pub output_suffix: String,
    /// Files anonymized at the same time; 1 runs the batch sequentially.
    pub workers: usize,
    /// How to launch deface, e.g. `deface` or `python3 -m deface`.
    pub deface_command: String,
    pub frame_interval: SamplingInterval,
    pub frame_format: FrameFormat,
    pub auto_rotate: bool,
    /// Fixed rotation for extracted frames; `None` follows `auto_rotate`.
    pub frame_rotation: Option<Rotation>,
    pub overwrite_frames: bool,
    pub appearance: Appearance,
    pub high_contrast: bool,
    pub font_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            params: AnonymizationParams::default(),
            repair_corrupt: false,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            workers: 1,
            deface_command: DEFACE_PROGRAM.to_string(),
            frame_interval: SamplingInterval::default(),
            frame_format: FrameFormat::default(),
            auto_rotate: true,
            frame_rotation: None,
            overwrite_frames: false,
            appearance: Appearance::System,
            high_contrast: false,
            font_scale: 1.0,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Deface Studio").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Could not save settings to {}: {e}", path.display());
            }
        }
    }

    /// Reads settings from `path`; unreadable or malformed files give defaults.
    pub fn load_from(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Ignoring malformed settings in {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Resets the job defaults, keeping appearance preferences.
    pub fn restore_job_defaults(&mut self) {
        let defaults = Settings::default();
        self.params = defaults.params;
        self.repair_corrupt = defaults.repair_corrupt;
        self.output_suffix = defaults.output_suffix;
        self.workers = defaults.workers;
        self.deface_command = defaults.deface_command;
        self.frame_interval = defaults.frame_interval;
        self.frame_format = defaults.frame_format;
        self.auto_rotate = defaults.auto_rotate;
        self.frame_rotation = defaults.frame_rotation;
        self.overwrite_frames = defaults.overwrite_frames;
    }

    fn sanitized(mut self) -> Self {
        self.workers = self.workers.clamp(1, MAX_WORKERS);
        self.font_scale = self.font_scale.clamp(0.8, 1.5);
        if self.params.validate().is_err() {
            self.params = AnonymizationParams::default();
        }
        if self.frame_interval.validate().is_err() {
            self.frame_interval = SamplingInterval::default();
        }
        self
    }
}
