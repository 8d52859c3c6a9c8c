use std::sync::atomic::{AtomicBool, Ordering};

use crate::pipeline::batch_executor::{BatchExecutor, BatchTask};
use crate::pipeline::job::JobResult;

const DEFAULT_WORKERS: usize = 2;
const LOST_WORKER: &str = "worker thread stopped unexpectedly";

/// Runs up to `workers` files at once on scoped worker threads.
///
/// Indices are fed through a bounded channel so a worker only claims a file
/// when it is free; cancellation is checked at claim time. Results are put
/// back into input order before returning.
pub struct ThreadedBatchExecutor {
    workers: usize,
}

impl ThreadedBatchExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ThreadedBatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl BatchExecutor for ThreadedBatchExecutor {
    fn execute(&self, task: &dyn BatchTask, cancelled: &AtomicBool) -> Vec<JobResult> {
        let len = task.len();
        let workers = self.workers.min(len);
        if workers == 0 {
            return Vec::new();
        }

        let (index_tx, index_rx) = crossbeam_channel::bounded::<usize>(workers);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, JobResult)>();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let index_rx = index_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        for index in index_rx {
                            let result = if cancelled.load(Ordering::Relaxed) {
                                task.cancel(index)
                            } else {
                                task.run(index)
                            };
                            if result_tx.send((index, result)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            // Only workers may hold these, so a dead pool closes the channels.
            drop(index_rx);
            drop(result_tx);

            for index in 0..len {
                if index_tx.send(index).is_err() {
                    break;
                }
            }
            drop(index_tx);

            for handle in handles {
                if handle.join().is_err() {
                    log::error!("Batch worker thread panicked");
                }
            }
        });

        let mut slots: Vec<Option<JobResult>> = vec![None; len];
        for (index, result) in result_rx.try_iter() {
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or_else(|| task.abandon(index, LOST_WORKER)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::job::JobStatus;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Later indices finish first, so completion order differs from input order.
    struct SlowFirstTask {
        len: usize,
        running: AtomicUsize,
        peak: AtomicUsize,
        panic_on: Option<usize>,
    }

    impl SlowFirstTask {
        fn new(len: usize) -> Self {
            Self {
                len,
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                panic_on: None,
            }
        }
    }

    impl BatchTask for SlowFirstTask {
        fn len(&self) -> usize {
            self.len
        }

        fn run(&self, index: usize) -> JobResult {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(((self.len - index) * 5) as u64));
            self.running.fetch_sub(1, Ordering::SeqCst);
            if self.panic_on == Some(index) {
                panic!("simulated worker crash");
            }
            JobResult::success(format!("in{index}"), format!("out{index}"))
        }

        fn cancel(&self, index: usize) -> JobResult {
            JobResult::cancelled(format!("in{index}"), format!("out{index}"))
        }

        fn abandon(&self, index: usize, reason: &str) -> JobResult {
            JobResult::failed(format!("in{index}"), format!("out{index}"), reason)
        }
    }

    #[test]
    fn test_results_follow_input_order() {
        let task = SlowFirstTask::new(6);
        let results = ThreadedBatchExecutor::new(3).execute(&task, &AtomicBool::new(false));

        let inputs: Vec<_> = results
            .iter()
            .map(|r| r.input.to_string_lossy().into_owned())
            .collect();
        assert_eq!(inputs, vec!["in0", "in1", "in2", "in3", "in4", "in5"]);
        assert!(results.iter().all(JobResult::is_success));
    }

    #[test]
    fn test_never_exceeds_worker_count() {
        let task = SlowFirstTask::new(8);
        ThreadedBatchExecutor::new(2).execute(&task, &AtomicBool::new(false));
        assert!(task.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_cancelled_before_start_runs_nothing() {
        let task = SlowFirstTask::new(4);
        let results = ThreadedBatchExecutor::new(2).execute(&task, &AtomicBool::new(true));
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.status == JobStatus::Cancelled));
        assert_eq!(task.peak.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_midway_keeps_one_result_per_file() {
        struct CancelOnFirst<'a> {
            flag: &'a AtomicBool,
            ran: Mutex<usize>,
        }
        impl BatchTask for CancelOnFirst<'_> {
            fn len(&self) -> usize {
                10
            }
            fn run(&self, index: usize) -> JobResult {
                *self.ran.lock().unwrap() += 1;
                self.flag.store(true, Ordering::SeqCst);
                JobResult::success(format!("in{index}"), "out")
            }
            fn cancel(&self, index: usize) -> JobResult {
                JobResult::cancelled(format!("in{index}"), "out")
            }

            fn abandon(&self, index: usize, reason: &str) -> JobResult {
                JobResult::failed(format!("in{index}"), "out", reason)
            }
        }

        let flag = AtomicBool::new(false);
        let task = CancelOnFirst {
            flag: &flag,
            ran: Mutex::new(0),
        };
        let results = ThreadedBatchExecutor::new(2).execute(&task, &flag);

        assert_eq!(results.len(), 10);
        let ran = *task.ran.lock().unwrap();
        assert!((1..=2).contains(&ran));
        assert_eq!(
            results.iter().filter(|r| r.status == JobStatus::Cancelled).count(),
            10 - ran
        );
    }

    #[test]
    fn test_panicking_worker_reports_failure_for_its_file() {
        let mut task = SlowFirstTask::new(3);
        task.panic_on = Some(1);
        let results = ThreadedBatchExecutor::new(1).execute(&task, &AtomicBool::new(false));

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].status, JobStatus::Success);
        assert_eq!(results[1].status, JobStatus::Failed);
        assert_eq!(results[1].input.to_string_lossy(), "in1");
        assert_eq!(results[1].error.as_deref(), Some(LOST_WORKER));
    }

    #[test]
    fn test_zero_workers_is_clamped() {
        assert_eq!(ThreadedBatchExecutor::new(0).workers(), 1);
    }
}
