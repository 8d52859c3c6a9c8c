use std::path::Path;

use super::anonymization_params::AnonymizationParams;
use super::anonymize_error::AnonymizeError;

/// Progress callback: `(frames_done, frames_total)`. `frames_total` is 0 when unknown.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Sync);

/// Port to the external face anonymization capability.
///
/// One call processes one file end to end: detection, masking, and encoding
/// all happen on the other side of this interface.
pub trait Anonymizer: Send + Sync {
    /// Verifies the capability can be invoked. Returns its version string.
    fn check_available(&self) -> Result<String, AnonymizeError>;

    /// Anonymizes `input` into `output` with the given parameters.
    fn anonymize(
        &self,
        input: &Path,
        output: &Path,
        params: &AnonymizationParams,
        on_progress: ProgressFn<'_>,
    ) -> Result<(), AnonymizeError>;
}
