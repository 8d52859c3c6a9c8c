use std::path::Path;

/// Creates `dir` if needed and proves it accepts new files.
pub(crate) fn ensure_writable_dir(dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("cannot create output folder {}: {e}", dir.display()))?;
    tempfile::Builder::new()
        .prefix(".write-check")
        .tempfile_in(dir)
        .map_err(|e| format!("output folder {} is not writable: {e}", dir.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_missing_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a").join("b");
        ensure_writable_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_path_below_a_file_fails() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let err = ensure_writable_dir(&blocker.join("out")).unwrap_err();
        assert!(err.starts_with("cannot create output folder"));
    }
}
