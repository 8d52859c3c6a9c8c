use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Clockwise rotation to apply to decoded frames so they display upright.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Snaps an arbitrary angle in degrees to the nearest quarter turn.
    pub fn from_degrees(angle: i32) -> Self {
        match angle.rem_euclid(360) {
            45..=134 => Rotation::Cw90,
            135..=224 => Rotation::Cw180,
            225..=315 => Rotation::Cw270,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// True when width and height trade places after rotating.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Cw270)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rotation::None => write!(f, "none"),
            Rotation::Cw90 => write!(f, "90\u{b0} clockwise"),
            Rotation::Cw180 => write!(f, "180\u{b0}"),
            Rotation::Cw270 => write!(f, "90\u{b0} counter-clockwise"),
        }
    }
}

/// Accepts `none`, `cw`, `ccw`, `180` or a clockwise angle in degrees.
impl std::str::FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Rotation::None),
            "cw" => Ok(Rotation::Cw90),
            "ccw" => Ok(Rotation::Cw270),
            other => match other.parse::<i32>() {
                Ok(angle) if angle % 90 == 0 => Ok(Rotation::from_degrees(angle)),
                _ => Err(format!(
                    "unknown rotation '{other}' (expected none, cw, ccw, 90, 180 or 270)"
                )),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container-reported or duration-estimated frame count; 0 if unknown.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
    pub rotation: Rotation,
}

impl VideoMetadata {
    /// Dimensions as displayed, after applying `rotation`.
    pub fn display_size(&self) -> (u32, u32) {
        if self.rotation.swaps_dimensions() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}
