/// Executable name of the external anonymizer, resolved through `PATH`.
pub const DEFACE_PROGRAM: &str = "deface";

// Defaults of the deface CLI. Arguments equal to these are not passed.
pub const DEFAULT_THRESHOLD: f64 = 0.2;
pub const DEFAULT_MASK_SCALE: f64 = 1.3;
pub const DEFAULT_MOSAIC_SIZE: u32 = 20;

/// Downscale factor meaning "detect at full resolution".
pub const NO_DOWNSCALE: f64 = 1.0;

pub const DEFAULT_OUTPUT_SUFFIX: &str = "_anonymized";
pub const FRAMES_DIR_SUFFIX: &str = "_frames";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "m4v"];

/// Number of trailing stderr lines kept for error reports.
pub const STDERR_TAIL_LINES: usize = 12;

/// Frame extraction interval used when the user has not chosen one.
pub const DEFAULT_FRAME_INTERVAL_SECONDS: f64 = 0.2;
