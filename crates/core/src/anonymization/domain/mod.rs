pub mod anonymization_params;
pub mod anonymize_error;
pub mod anonymizer;
