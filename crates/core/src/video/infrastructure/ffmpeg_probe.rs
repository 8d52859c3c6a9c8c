use std::path::Path;

use crate::shared::media_type::MediaType;
use crate::video::domain::media_probe::MediaProbe;
use crate::video::domain::video_reader::VideoReader;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Reports upright (display) dimensions: image headers are read with the
/// `image` crate, everything else is opened with FFmpeg.
pub struct FfmpegProbe;

impl MediaProbe for FfmpegProbe {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), Box<dyn std::error::Error>> {
        if MediaType::from_path(path) == MediaType::Image {
            return Ok(image::image_dimensions(path)?);
        }

        let mut reader = FfmpegReader::new();
        let metadata = reader.open(path)?;
        reader.close();
        Ok(metadata.display_size())
    }
}
