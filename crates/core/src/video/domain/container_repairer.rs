use std::path::Path;

/// Rewrites a damaged media container into a fresh one without re-encoding.
pub trait ContainerRepairer: Send + Sync {
    /// Writes a repaired copy of `input` to `output`. The container format is
    /// chosen from `output`'s extension.
    fn repair(&self, input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>>;
}
