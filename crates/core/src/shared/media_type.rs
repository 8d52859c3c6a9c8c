use std::path::Path;

use super::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

/// Coarse media classification by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
    Unknown,
}

impl MediaType {
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
        else {
            return MediaType::Unknown;
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaType::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaType::Video
        } else {
            MediaType::Unknown
        }
    }
}

pub fn is_image(path: &Path) -> bool {
    MediaType::from_path(path) == MediaType::Image
}

pub fn is_video(path: &Path) -> bool {
    MediaType::from_path(path) == MediaType::Video
}

/// Lists the images directly inside `dir` (not recursive), sorted by path.
pub fn images_in_dir(dir: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    media_in_dir(dir, MediaType::Image)
}

/// Lists the files of `kind` directly inside `dir` (not recursive), sorted by
/// path.
pub fn media_in_dir(dir: &Path, kind: MediaType) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && MediaType::from_path(&path) == kind {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
