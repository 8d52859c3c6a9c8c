use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::anonymization::domain::anonymization_params::AnonymizationParams;
use crate::anonymization::domain::anonymize_error::{AnonymizeError, FailureKind};
use crate::anonymization::domain::anonymizer::{Anonymizer, ProgressFn};
use crate::shared::constants::{DEFACE_PROGRAM, STDERR_TAIL_LINES};
use crate::video::domain::media_probe::MediaProbe;

use super::{deface_args, deface_output};

/// Runs the `deface` command-line tool once per file.
///
/// The command can be a bare executable (`deface`) or an interpreter with
/// leading arguments (`python -m deface`). Progress is scraped from the
/// tqdm bar deface draws on stderr.
pub struct DefaceAnonymizer {
    program: PathBuf,
    leading_args: Vec<OsString>,
    probe: Box<dyn MediaProbe>,
}

impl DefaceAnonymizer {
    /// Uses `deface` from `PATH`.
    pub fn new(probe: Box<dyn MediaProbe>) -> Self {
        Self::with_command(DEFACE_PROGRAM, Vec::new(), probe)
    }

    pub fn with_command(
        program: impl Into<PathBuf>,
        leading_args: Vec<OsString>,
        probe: Box<dyn MediaProbe>,
    ) -> Self {
        Self {
            program: program.into(),
            leading_args,
            probe,
        }
    }

    /// Parses a command line such as `python3 -m deface`, split on
    /// whitespace. `None` for a blank command.
    pub fn from_command_line(command: &str, probe: Box<dyn MediaProbe>) -> Option<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next()?;
        Some(Self::with_command(
            program,
            parts.map(OsString::from).collect(),
            probe,
        ))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args).stdin(Stdio::null());
        cmd
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn spawn_error(&self, source: std::io::Error) -> AnonymizeError {
        if source.kind() == std::io::ErrorKind::NotFound {
            AnonymizeError::MissingDependency {
                program: self.program_name(),
            }
        } else {
            AnonymizeError::Spawn {
                program: self.program_name(),
                source,
            }
        }
    }

    fn detection_size(
        &self,
        input: &Path,
        params: &AnonymizationParams,
    ) -> Result<Option<(u32, u32)>, AnonymizeError> {
        if params.detection_size(1, 1).is_none() {
            return Ok(None);
        }
        let (width, height) =
            self.probe
                .dimensions(input)
                .map_err(|e| AnonymizeError::Probe {
                    path: input.to_path_buf(),
                    message: e.to_string(),
                })?;
        Ok(params.detection_size(width, height))
    }

    fn failure(&self, status: ExitStatus, tail: &VecDeque<String>) -> AnonymizeError {
        for line in tail {
            log::warn!("{}: {line}", self.program_name());
        }
        AnonymizeError::Failed {
            program: self.program_name(),
            status: describe_status(status),
            kind: deface_output::classify(tail),
            summary: deface_output::summarize(tail),
        }
    }
}

impl Anonymizer for DefaceAnonymizer {
    fn check_available(&self) -> Result<String, AnonymizeError> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .map_err(|e| self.spawn_error(e))?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            let tail: VecDeque<String> = stderr.lines().map(str::to_string).collect();
            return Err(self.failure(output.status, &tail));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = if stdout.trim().is_empty() {
            stderr.trim().to_string()
        } else {
            stdout.trim().to_string()
        };
        Ok(version)
    }

    fn anonymize(
        &self,
        input: &Path,
        output: &Path,
        params: &AnonymizationParams,
        on_progress: ProgressFn<'_>,
    ) -> Result<(), AnonymizeError> {
        let detection_size = self.detection_size(input, params)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AnonymizeError::Output {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let args = deface_args::build(input, output, params, detection_size);
        let mut full_args = self.leading_args.clone();
        full_args.extend(args.iter().cloned());
        log::info!(
            "Executing command: {}",
            deface_args::display(&self.program, &full_args)
        );

        // A stale file from an earlier run must not pass for this run's output.
        remove_stale_output(output)?;

        let mut child = self
            .command()
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // deface reports unreadable inputs on stdout and draws tqdm on stderr.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout_tail, stderr_tail) = std::thread::scope(|s| {
            let stdout_reader = s.spawn(|| match stdout {
                Some(stream) => deface_output::drain(stream, STDERR_TAIL_LINES, &|_, _| {}),
                None => VecDeque::new(),
            });
            let stderr_tail = match stderr {
                Some(stream) => deface_output::drain(stream, STDERR_TAIL_LINES, on_progress),
                None => VecDeque::new(),
            };
            (stdout_reader.join().unwrap_or_default(), stderr_tail)
        });
        let tail = merge_tails(stdout_tail, stderr_tail);

        let status = child.wait().map_err(|source| AnonymizeError::Spawn {
            program: self.program_name(),
            source,
        })?;

        if !status.success() {
            return Err(self.failure(status, &tail));
        }
        if !output.exists() {
            for line in &tail {
                log::warn!("{}: {line}", self.program_name());
            }
            let summary = if tail.is_empty() {
                format!("no output was written to {}", output.display())
            } else {
                format!(
                    "no output was written to {}: {}",
                    output.display(),
                    deface_output::summarize(&tail)
                )
            };
            return Err(AnonymizeError::Failed {
                program: self.program_name(),
                status: describe_status(status),
                kind: deface_output::classify(&tail),
                summary,
            });
        }
        Ok(())
    }
}

fn remove_stale_output(output: &Path) -> Result<(), AnonymizeError> {
    match std::fs::remove_file(output) {
        Ok(()) => {
            log::debug!("Removed previous output {}", output.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(AnonymizeError::Output {
            path: output.to_path_buf(),
            source,
        }),
    }
}

/// Stdout lines first, so the last stderr line stays the summary when both
/// streams have diagnostics.
fn merge_tails(stdout: VecDeque<String>, stderr: VecDeque<String>) -> VecDeque<String> {
    let mut tail = stdout;
    tail.extend(stderr);
    while tail.len() > STDERR_TAIL_LINES {
        tail.pop_front();
    }
    tail
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
