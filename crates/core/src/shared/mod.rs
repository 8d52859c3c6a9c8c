pub mod constants;
pub mod frame;
pub mod media_type;
pub mod video_metadata;
