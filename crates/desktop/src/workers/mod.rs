pub mod batch_worker;
pub mod extract_worker;
