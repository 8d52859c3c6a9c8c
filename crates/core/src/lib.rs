//! Batch orchestration around the `deface` face anonymizer.
//!
//! The crate owns the job model, the batch runner, and frame extraction.
//! Face detection and masking happen in the external `deface` executable;
//! decoding, probing, and re-muxing go through FFmpeg.

pub mod anonymization;
pub mod pipeline;
pub mod shared;
pub mod video;
