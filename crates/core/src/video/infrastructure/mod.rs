pub mod ffmpeg_probe;
pub mod ffmpeg_reader;
pub mod ffmpeg_remuxer;
pub mod image_file_writer;
