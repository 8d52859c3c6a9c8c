use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{error, info, warn};

use crate::anonymization::domain::anonymization_params::AnonymizationParams;
use crate::anonymization::domain::anonymize_error::AnonymizeError;
use crate::anonymization::domain::anonymizer::{Anonymizer, ProgressFn};
use crate::video::domain::container_repairer::ContainerRepairer;

use super::batch_events::{BatchEvent, BatchObserver};
use super::batch_executor::{BatchExecutor, BatchTask};
use super::job::{BatchReport, JobConfig, JobResult};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::preflight::ensure_writable_dir;

/// Runs the anonymizer over every input of a [`JobConfig`].
///
/// Each input yields exactly one [`JobResult`]; a failing file is recorded
/// and the batch moves on. Only the preflight checks (anonymizer installed,
/// output folder writable) can abort a batch, and even then every input
/// gets a failed result carrying the reason.
pub struct AnonymizeBatchUseCase {
    anonymizer: Box<dyn Anonymizer>,
    executor: Box<dyn BatchExecutor>,
    repairer: Option<Box<dyn ContainerRepairer>>,
    observer: Option<Box<dyn BatchObserver>>,
    logger: Mutex<Box<dyn PipelineLogger>>,
    cancelled: Arc<AtomicBool>,
}

impl AnonymizeBatchUseCase {
    pub fn new(
        anonymizer: Box<dyn Anonymizer>,
        executor: Box<dyn BatchExecutor>,
        repairer: Option<Box<dyn ContainerRepairer>>,
        observer: Option<Box<dyn BatchObserver>>,
        logger: Option<Box<dyn PipelineLogger>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            anonymizer,
            executor,
            repairer,
            observer,
            logger: Mutex::new(logger.unwrap_or_else(|| Box::new(NullPipelineLogger))),
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    /// Flag that stops the batch before the next file starts.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn execute(&self, config: &JobConfig) -> BatchReport {
        let outputs = config.planned_outputs();
        self.with_logger(|l| {
            l.info(&format!(
                "Starting batch of {} file(s), output folder {}",
                config.inputs.len(),
                config.output_dir.display()
            ))
        });

        if let Err(message) = self.preflight(config) {
            error!("Batch aborted: {message}");
            return self.abort(config, &outputs, message);
        }

        let task = AnonymizeTask {
            use_case: self,
            config,
            outputs: &outputs,
            finished: AtomicUsize::new(0),
        };
        let results = self.executor.execute(&task, &self.cancelled);

        let report = BatchReport {
            results,
            fatal: None,
        };
        self.with_logger(|l| {
            l.info(&report.summary());
            l.summary();
        });
        report
    }

    fn preflight(&self, config: &JobConfig) -> Result<(), String> {
        config.params.validate()?;
        let version = self.anonymizer.check_available().map_err(|e| e.report())?;
        info!("Using anonymizer {}", version.lines().next().unwrap_or("(unknown version)"));
        ensure_writable_dir(&config.output_dir)
    }

    fn abort(&self, config: &JobConfig, outputs: &[PathBuf], message: String) -> BatchReport {
        let results: Vec<JobResult> = config
            .inputs
            .iter()
            .zip(outputs)
            .map(|(input, output)| JobResult::failed(input, output, message.clone()))
            .collect();
        for (index, result) in results.iter().enumerate() {
            self.notify(BatchEvent::FileFinished {
                index,
                result: result.clone(),
            });
        }
        BatchReport {
            results,
            fatal: Some(message),
        }
    }

    fn process(&self, index: usize, input: &Path, output: &Path, config: &JobConfig) -> JobResult {
        self.notify(BatchEvent::FileStarted {
            index,
            input: input.to_path_buf(),
        });
        let started = Instant::now();

        let on_progress = |current: usize, total: usize| {
            self.notify(BatchEvent::FileProgress {
                index,
                current,
                total,
            })
        };

        let result = match self.anonymize_file(input, output, config, &on_progress) {
            Ok(()) => {
                info!("Anonymized {} -> {}", input.display(), output.display());
                JobResult::success(input, output)
            }
            Err(e) => {
                warn!("Failed to anonymize {}: {e}", input.display());
                JobResult::failed(input, output, e.report())
            }
        };

        self.with_logger(|l| l.timing("anonymize", started.elapsed().as_secs_f64() * 1000.0));
        self.notify(BatchEvent::FileFinished {
            index,
            result: result.clone(),
        });
        result
    }

    fn anonymize_file(
        &self,
        input: &Path,
        output: &Path,
        config: &JobConfig,
        on_progress: ProgressFn<'_>,
    ) -> Result<(), AnonymizeError> {
        check_input(input, output)?;

        match self
            .anonymizer
            .anonymize(input, output, &config.params, on_progress)
        {
            Err(e) if e.is_corrupt_input() && config.repair_corrupt => {
                self.retry_repaired(input, output, &config.params, on_progress, e)
            }
            other => other,
        }
    }

    /// Remuxes a damaged input into a scratch folder and runs the anonymizer
    /// once more on the copy. Any repair problem surfaces the first error.
    fn retry_repaired(
        &self,
        input: &Path,
        output: &Path,
        params: &AnonymizationParams,
        on_progress: ProgressFn<'_>,
        first_error: AnonymizeError,
    ) -> Result<(), AnonymizeError> {
        let Some(repairer) = &self.repairer else {
            return Err(first_error);
        };

        let scratch = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("No scratch folder for repairing {}: {e}", input.display());
                return Err(first_error);
            }
        };
        let extension = input
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mp4".to_string());
        let repaired = scratch.path().join(format!("repaired.{extension}"));

        info!("Repairing container of {}", input.display());
        let started = Instant::now();
        if let Err(e) = repairer.repair(input, &repaired) {
            warn!("Could not repair {}: {e}", input.display());
            return Err(first_error);
        }
        self.with_logger(|l| l.timing("repair", started.elapsed().as_secs_f64() * 1000.0));

        self.anonymizer
            .anonymize(&repaired, output, params, on_progress)
    }

    fn notify(&self, event: BatchEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(event);
        }
    }

    fn with_logger(&self, f: impl FnOnce(&mut dyn PipelineLogger)) {
        // A poisoned logger only means another worker panicked mid-log.
        let mut guard = self.logger.lock().unwrap_or_else(|p| p.into_inner());
        f(guard.as_mut());
    }
}

fn check_input(input: &Path, output: &Path) -> Result<(), AnonymizeError> {
    let metadata = std::fs::metadata(input).map_err(|e| AnonymizeError::Input {
        path: input.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !metadata.is_file() {
        return Err(AnonymizeError::Input {
            path: input.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    std::fs::File::open(input).map_err(|e| AnonymizeError::Input {
        path: input.to_path_buf(),
        reason: e.to_string(),
    })?;
    if input == output {
        return Err(AnonymizeError::Output {
            path: output.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "output would overwrite the input",
            ),
        });
    }
    Ok(())
}

/// Adapts one batch run to the executor's per-index interface.
struct AnonymizeTask<'a> {
    use_case: &'a AnonymizeBatchUseCase,
    config: &'a JobConfig,
    outputs: &'a [PathBuf],
    finished: AtomicUsize,
}

impl BatchTask for AnonymizeTask<'_> {
    fn len(&self) -> usize {
        self.config.inputs.len()
    }

    fn run(&self, index: usize) -> JobResult {
        let result = self.use_case.process(
            index,
            &self.config.inputs[index],
            &self.outputs[index],
            self.config,
        );
        let done = self.finished.fetch_add(1, Ordering::SeqCst) + 1;
        self.use_case.with_logger(|l| l.progress(done, self.len()));
        result
    }

    fn cancel(&self, index: usize) -> JobResult {
        let result = JobResult::cancelled(&self.config.inputs[index], &self.outputs[index]);
        self.use_case.notify(BatchEvent::FileFinished {
            index,
            result: result.clone(),
        });
        result
    }

    fn abandon(&self, index: usize, reason: &str) -> JobResult {
        log::error!("{}: {reason}", self.config.inputs[index].display());
        let result = JobResult::failed(&self.config.inputs[index], &self.outputs[index], reason);
        self.use_case.notify(BatchEvent::FileFinished {
            index,
            result: result.clone(),
        });
        result
    }
}
