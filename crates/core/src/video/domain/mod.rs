pub mod container_repairer;
pub mod image_writer;
pub mod media_probe;
pub mod video_reader;
