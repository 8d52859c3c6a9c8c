use std::path::PathBuf;

use thiserror::Error;

/// Why the anonymizer rejected a file, derived from its diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Container metadata is damaged or truncated (e.g. missing MP4 `moov` atom).
    CorruptInput,
    /// The detector model could not be created.
    DetectorUnavailable,
    /// The input format is not something the anonymizer can read.
    UnsupportedFormat,
    Other,
}

impl FailureKind {
    /// Remediation advice shown next to the error.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            FailureKind::CorruptInput => Some(
                "The file's container metadata looks damaged. Try re-muxing it \
                 (ffmpeg -i input.mp4 -c copy fixed.mp4), enable \"Repair corrupt inputs\", \
                 or convert it to .mkv/.avi.",
            ),
            FailureKind::DetectorUnavailable => Some(
                "The face detection model could not be loaded. Try reinstalling deface \
                 (pip uninstall deface && pip install deface).",
            ),
            FailureKind::UnsupportedFormat => {
                Some("The file format is not supported. Convert it to MP4 or JPEG/PNG first.")
            }
            FailureKind::Other => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AnonymizeError {
    #[error("'{program}' was not found; install deface (pip install deface) and make sure it is on PATH")]
    MissingDependency { program: String },
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read input {path}: {reason}")]
    Input { path: PathBuf, reason: String },
    #[error("cannot prepare output location {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read media dimensions of {path}: {message}")]
    Probe { path: PathBuf, message: String },
    #[error("{program} failed ({status}): {summary}")]
    Failed {
        program: String,
        status: String,
        kind: FailureKind,
        summary: String,
    },
}

impl AnonymizeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AnonymizeError::Failed { kind, .. } => *kind,
            _ => FailureKind::Other,
        }
    }

    pub fn is_corrupt_input(&self) -> bool {
        self.kind() == FailureKind::CorruptInput
    }

    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, AnonymizeError::MissingDependency { .. })
    }

    /// Error text with the remediation hint appended, for per-file reports.
    pub fn report(&self) -> String {
        match self.kind().hint() {
            Some(hint) => format!("{self}. {hint}"),
            None => self.to_string(),
        }
    }
}
