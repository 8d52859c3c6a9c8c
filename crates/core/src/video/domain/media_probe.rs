use std::path::Path;

/// Reads the pixel dimensions of a video or image without decoding it fully.
pub trait MediaProbe: Send + Sync {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), Box<dyn std::error::Error>>;
}
