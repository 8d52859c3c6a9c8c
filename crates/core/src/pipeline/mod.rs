pub mod anonymize_batch_use_case;
pub mod batch_events;
pub mod batch_executor;
pub mod extract_error;
pub mod extract_frames_use_case;
pub mod extraction_job;
pub mod infrastructure;
pub mod job;
pub mod pipeline_logger;
mod preflight;
