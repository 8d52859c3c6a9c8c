use std::sync::atomic::{AtomicBool, Ordering};

use crate::pipeline::batch_executor::{BatchExecutor, BatchTask};
use crate::pipeline::job::JobResult;

/// Runs files one after another on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialBatchExecutor;

impl BatchExecutor for SequentialBatchExecutor {
    fn execute(&self, task: &dyn BatchTask, cancelled: &AtomicBool) -> Vec<JobResult> {
        (0..task.len())
            .map(|index| {
                if cancelled.load(Ordering::Relaxed) {
                    task.cancel(index)
                } else {
                    task.run(index)
                }
            })
            .collect()
    }
}
