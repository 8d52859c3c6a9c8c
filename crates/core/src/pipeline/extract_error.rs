use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{0}")]
    InvalidInterval(String),
    #[error("cannot open video {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("decoding {path} failed at frame {frame}: {message}")]
    Decode {
        path: PathBuf,
        frame: usize,
        message: String,
    },
    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },
}
