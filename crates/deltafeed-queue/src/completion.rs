//! Explicit completion tokens
//!
//! A task receives exactly one [`Completion`] and must consume it. Dropping
//! the token without calling [`Completion::succeed`] or [`Completion::fail`]
//! is reported as [`QueueError::NoCompletion`](crate::QueueError::NoCompletion).

use tokio::sync::oneshot;

/// Outcome a task reports through its token
pub(crate) type Signal<T> = Result<T, String>;

/// Single-use token a task consumes to signal that processing ended
#[derive(Debug)]
pub struct Completion<T> {
    label: String,
    tx: oneshot::Sender<Signal<T>>,
}

impl<T> Completion<T> {
    pub(crate) fn new(label: String) -> (Self, oneshot::Receiver<Signal<T>>) {
        let (tx, rx) = oneshot::channel();
        (Self { label, tx }, rx)
    }

    /// Label of the task holding this token
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Signal that the task finished with `value`
    pub fn succeed(self, value: T) {
        // The worker only stops listening once it has given up on the task
        let _ = self.tx.send(Ok(value));
    }

    /// Signal that the task failed
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.tx.send(Err(reason.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_succeed_delivers_value() {
        let (completion, rx) = Completion::new("feed".to_string());
        assert_eq!(completion.label(), "feed");
        completion.succeed(7);
        assert_eq!(rx.await.unwrap(), Ok(7));
    }

    #[tokio::test]
    async fn test_fail_delivers_reason() {
        let (completion, rx) = Completion::<()>::new("feed".to_string());
        completion.fail("boom");
        assert_eq!(rx.await.unwrap(), Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_token_closes_channel() {
        let (completion, rx) = Completion::<()>::new("feed".to_string());
        drop(completion);
        assert!(rx.await.is_err());
    }
}
