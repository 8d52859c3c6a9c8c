use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::anonymization::domain::anonymization_params::AnonymizationParams;
use crate::shared::constants::DEFAULT_OUTPUT_SUFFIX;

/// Everything a batch run needs. Built by the configurator and not touched
/// again once the batch starts.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub params: AnonymizationParams,
    /// Remux inputs with damaged containers and retry once.
    pub repair_corrupt: bool,
    /// Appended to each input's file stem to name its output.
    pub output_suffix: String,
}

impl JobConfig {
    pub fn new(inputs: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            inputs,
            output_dir: output_dir.into(),
            params: AnonymizationParams::default(),
            repair_corrupt: false,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }

    pub fn with_params(mut self, params: AnonymizationParams) -> Self {
        self.params = params;
        self
    }

    /// `{output_dir}/{stem}{suffix}.{ext}` for a single input.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        self.output_dir.join(output_name(input, &self.output_suffix, None))
    }

    /// Output path for every input, in input order.
    ///
    /// Inputs from different folders can share a file name; later ones get a
    /// `_2`, `_3`, ... counter so no two jobs write the same file.
    pub fn planned_outputs(&self) -> Vec<PathBuf> {
        let mut taken = HashSet::new();
        self.inputs
            .iter()
            .map(|input| {
                let mut candidate = self.output_path_for(input);
                let mut counter = 2;
                while taken.contains(&candidate) {
                    candidate = self.output_dir.join(output_name(
                        input,
                        &self.output_suffix,
                        Some(counter),
                    ));
                    counter += 1;
                }
                taken.insert(candidate.clone());
                candidate
            })
            .collect()
    }
}

fn output_name(input: &Path, suffix: &str, counter: Option<usize>) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let counter = counter.map(|n| format!("_{n}")).unwrap_or_default();
    match input.extension() {
        Some(ext) => format!("{stem}{suffix}{counter}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}{counter}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    Failed,
    /// The batch was stopped before this file started.
    Cancelled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome for one input file. Created once and never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: JobStatus,
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            status: JobStatus::Success,
            error: None,
        }
    }

    pub fn failed(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            status: JobStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn cancelled(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            status: JobStatus::Cancelled,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}

/// All results of one batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub results: Vec<JobResult>,
    /// Set when a preflight check stopped the batch before any file ran.
    pub fatal: Option<String>,
}

impl BatchReport {
    pub fn count(&self, status: JobStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(JobStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(JobStatus::Failed)
    }

    pub fn cancelled(&self) -> usize {
        self.count(JobStatus::Cancelled)
    }

    /// No fatal error and every file succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.fatal.is_none() && self.results.iter().all(JobResult::is_success)
    }

    pub fn summary(&self) -> String {
        if let Some(fatal) = &self.fatal {
            return format!("Batch aborted: {fatal}");
        }
        let mut text = format!(
            "{} of {} file(s) anonymized",
            self.succeeded(),
            self.results.len()
        );
        if self.failed() > 0 {
            text.push_str(&format!(", {} failed", self.failed()));
        }
        if self.cancelled() > 0 {
            text.push_str(&format!(", {} cancelled", self.cancelled()));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(inputs: &[&str]) -> JobConfig {
        JobConfig::new(inputs.iter().map(PathBuf::from).collect(), "/out")
    }

    #[rstest]
    #[case("/videos/a.mp4", "/out/a_anonymized.mp4")]
    #[case("/photos/IMG_01.JPG", "/out/IMG_01_anonymized.JPG")]
    #[case("/videos/archive.tar.mkv", "/out/archive.tar_anonymized.mkv")]
    #[case("/videos/noext", "/out/noext_anonymized")]
    fn test_output_path_for(#[case] input: &str, #[case] expected: &str) {
        let cfg = config(&[]);
        assert_eq!(cfg.output_path_for(Path::new(input)), PathBuf::from(expected));
    }

    #[test]
    fn test_custom_suffix() {
        let mut cfg = config(&[]);
        cfg.output_suffix = "_blurred".to_string();
        assert_eq!(
            cfg.output_path_for(Path::new("/v/clip.mov")),
            PathBuf::from("/out/clip_blurred.mov")
        );
    }

    #[test]
    fn test_planned_outputs_one_per_input_in_order() {
        let cfg = config(&["/v/a.mp4", "/v/b.mp4", "/v/c.png"]);
        assert_eq!(
            cfg.planned_outputs(),
            vec![
                PathBuf::from("/out/a_anonymized.mp4"),
                PathBuf::from("/out/b_anonymized.mp4"),
                PathBuf::from("/out/c_anonymized.png"),
            ]
        );
    }

    #[test]
    fn test_planned_outputs_disambiguates_same_names() {
        let cfg = config(&["/day1/clip.mp4", "/day2/clip.mp4", "/day3/clip.mp4"]);
        assert_eq!(
            cfg.planned_outputs(),
            vec![
                PathBuf::from("/out/clip_anonymized.mp4"),
                PathBuf::from("/out/clip_anonymized_2.mp4"),
                PathBuf::from("/out/clip_anonymized_3.mp4"),
            ]
        );
    }

    #[test]
    fn test_report_counts_and_summary() {
        let report = BatchReport {
            results: vec![
                JobResult::success("a.mp4", "out/a.mp4"),
                JobResult::failed("b.mp4", "out/b.mp4", "boom"),
                JobResult::cancelled("c.mp4", "out/c.mp4"),
            ],
            fatal: None,
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.cancelled(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(
            report.summary(),
            "1 of 3 file(s) anonymized, 1 failed, 1 cancelled"
        );
    }

    #[test]
    fn test_fatal_report_summary() {
        let report = BatchReport {
            results: vec![JobResult::failed("a.mp4", "out/a.mp4", "no deface")],
            fatal: Some("no deface".to_string()),
        };
        assert!(!report.all_succeeded());
        assert_eq!(report.summary(), "Batch aborted: no deface");
    }

    #[test]
    fn test_empty_report_is_clean() {
        assert!(BatchReport::default().all_succeeded());
    }
}
