//! Deltafeed Processing Queue
//!
//! A single-lane task queue: at most one task runs at a time, tasks run in
//! enqueue order, and a pacing delay separates the end of one task from the
//! start of the next.
//!
//! # Completion
//!
//! A task does not finish when its future returns. It finishes when it
//! consumes its [`Completion`] token, exactly once, with
//! [`Completion::succeed`] or [`Completion::fail`]. A task that panics or
//! drops its token is reported as a [`QueueError`] and the queue moves on.
//!
//! # Examples
//!
//! ```
//! use deltafeed_queue::{ProcessingQueue, QueueConfig};
//! use futures::FutureExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (queue, mut reports) = ProcessingQueue::<usize>::new(QueueConfig::default());
//!
//! queue.enqueue("feed-0", |done| async move { done.succeed(3) }.boxed());
//! queue.start();
//!
//! let report = reports.recv().await.unwrap();
//! assert_eq!(report.outcome.unwrap(), 3);
//! # }
//! ```

#![warn(missing_docs)]

mod completion;
mod config;
mod error;
mod metrics;
mod queue;

pub use completion::Completion;
pub use config::QueueConfig;
pub use error::QueueError;
pub use metrics::QueueMetrics;
pub use queue::{ProcessingQueue, Task, TaskReport};
