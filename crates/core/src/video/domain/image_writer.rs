use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::Rotation;

/// Writes a single frame to an image file.
pub trait ImageWriter: Send {
    /// Writes `frame` to `path`, rotating it upright first. The image format
    /// follows the path's extension.
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        rotation: Rotation,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
