use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::Rotation;
use crate::video::domain::image_writer::ImageWriter;

const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Saves extracted frames with the `image` crate. JPEG output is encoded at a
/// fixed quality; every other extension goes through `image`'s format
/// detection.
pub struct ImageFileWriter {
    jpeg_quality: u8,
}

impl ImageFileWriter {
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(quality: u8) -> Self {
        Self {
            jpeg_quality: quality.clamp(1, 100),
        }
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        rotation: Rotation,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = frame
            .to_image(rotation)
            .ok_or("frame buffer does not match its dimensions")?;

        if is_jpeg(path) {
            let out = BufWriter::new(File::create(path)?);
            JpegEncoder::new_with_quality(out, self.jpeg_quality).encode_image(&img)?;
        } else {
            img.save(path)?;
        }
        Ok(())
    }
}
