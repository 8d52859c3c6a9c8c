use std::sync::atomic::AtomicBool;

use super::job::JobResult;

/// Per-file work handed to a [`BatchExecutor`].
pub trait BatchTask: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Processes file `index`. Always yields a result, failures included.
    fn run(&self, index: usize) -> JobResult;

    /// Result for a file skipped because the batch was cancelled.
    fn cancel(&self, index: usize) -> JobResult;

    /// Failed result for a file whose run never reported back.
    fn abandon(&self, index: usize, reason: &str) -> JobResult;
}

/// Decides how the files of a batch are scheduled.
///
/// Implementations must return exactly one result per task index, ordered by
/// index, and check `cancelled` before starting each file. A file that has
/// started always runs to completion.
pub trait BatchExecutor: Send + Sync {
    fn execute(&self, task: &dyn BatchTask, cancelled: &AtomicBool) -> Vec<JobResult>;
}
