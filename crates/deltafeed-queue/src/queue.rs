//! Single-lane processing queue
//!
//! Tasks run one at a time in enqueue order. After each task signals
//! completion the worker sleeps for the pacing delay before starting the
//! next. Outcomes are sent as [`TaskReport`]s on the report channel handed
//! out by [`ProcessingQueue::new`].

use crate::completion::Completion;
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::metrics::QueueMetrics;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// A unit of queued work
///
/// The closure receives the task's [`Completion`] token and returns the
/// future doing the work. The future is spawned on the runtime; the queue
/// waits for the token, not for the future.
pub type Task<T> = Box<dyn FnOnce(Completion<T>) -> BoxFuture<'static, ()> + Send>;

/// Outcome of one task, in execution order
#[derive(Debug)]
pub struct TaskReport<T> {
    /// Label given at enqueue time
    pub label: String,
    /// Value passed to `succeed`, or why there was none
    pub outcome: Result<T, QueueError>,
}

struct QueueState<T> {
    pending: VecDeque<(String, Task<T>)>,
    running: bool,
    metrics: QueueMetrics,
}

/// Serializes tasks onto a single worker with a pacing delay between them
pub struct ProcessingQueue<T> {
    state: Arc<Mutex<QueueState<T>>>,
    reports: mpsc::UnboundedSender<TaskReport<T>>,
    pacing: Duration,
}

impl<T> Clone for ProcessingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reports: self.reports.clone(),
            pacing: self.pacing,
        }
    }
}

impl<T: Send + 'static> ProcessingQueue<T> {
    /// Create an idle queue and the receiver its reports arrive on
    pub fn new(config: QueueConfig) -> (Self, mpsc::UnboundedReceiver<TaskReport<T>>) {
        let (reports, rx) = mpsc::unbounded_channel();
        let queue = Self {
            state: Arc::new(Mutex::new(QueueState {
                pending: VecDeque::new(),
                running: false,
                metrics: QueueMetrics::new(),
            })),
            reports,
            pacing: config.pacing(),
        };
        (queue, rx)
    }

    /// Append a task; it runs once the queue is started and earlier tasks are done
    pub fn enqueue<F>(&self, label: impl Into<String>, task: F)
    where
        F: FnOnce(Completion<T>) -> BoxFuture<'static, ()> + Send + 'static,
    {
        let label = label.into();
        let mut state = self.lock();
        debug!(task = %label, position = state.pending.len(), "Task enqueued");
        state.pending.push_back((label, Box::new(task)));
        state.metrics.enqueued += 1;
    }

    /// Start the worker if it is not already running
    ///
    /// Returns `false` when the queue was already running. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) -> bool {
        {
            let mut state = self.lock();
            if state.running {
                return false;
            }
            state.running = true;
        }

        let queue = self.clone();
        tokio::spawn(async move { queue.work().await });
        true
    }

    /// Whether the worker is active
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Snapshot of the queue's counters
    pub fn metrics(&self) -> QueueMetrics {
        self.lock().metrics
    }

    async fn work(self) {
        info!(pacing = ?self.pacing, "Queue worker started");

        loop {
            let next = {
                let mut state = self.lock();
                match state.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        state.running = false;
                        state.metrics.drains += 1;
                        info!("Queue drained: {}", state.metrics.summary());
                        return;
                    }
                }
            };

            let (label, task) = next;
            let outcome = run_task(&label, task).await;

            {
                let mut state = self.lock();
                match &outcome {
                    Ok(_) => state.metrics.succeeded += 1,
                    Err(e) => {
                        state.metrics.failed += 1;
                        error!("{}", e);
                    }
                }
            }

            if self.reports.send(TaskReport { label, outcome }).is_err() {
                debug!("Report receiver closed");
            }

            tokio::time::sleep(self.pacing).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_task<T: Send + 'static>(label: &str, task: Task<T>) -> Result<T, QueueError> {
    debug!(task = %label, "Task started");

    let (completion, rx) = Completion::new(label.to_string());
    let handle = tokio::spawn(task(completion));

    match rx.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(reason)) => Err(QueueError::TaskFailed {
            label: label.to_string(),
            reason,
        }),
        // Token dropped: either the task panicked or it forgot to signal
        Err(_) => match handle.await {
            Err(join) if join.is_panic() => Err(QueueError::TaskPanicked(label.to_string())),
            _ => Err(QueueError::NoCompletion(label.to_string())),
        },
    }
}
