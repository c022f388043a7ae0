//! Error types for queued tasks

use thiserror::Error;

/// Why a queued task did not complete successfully
///
/// None of these stop the queue; the next task runs after the pacing delay.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    /// The task reported failure through its completion token
    #[error("Task '{label}' failed: {reason}")]
    TaskFailed {
        /// Task label
        label: String,
        /// Reported reason
        reason: String,
    },

    /// The task panicked before completing
    #[error("Task '{0}' panicked")]
    TaskPanicked(String),

    /// The task finished without signalling completion
    #[error("Task '{0}' ended without signalling completion")]
    NoCompletion(String),
}
