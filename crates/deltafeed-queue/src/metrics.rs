//! Counters for queue activity

/// Metrics collected while the queue runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetrics {
    /// Tasks accepted by `enqueue`
    pub enqueued: usize,

    /// Tasks that completed successfully
    pub succeeded: usize,

    /// Tasks that failed, panicked or never signalled completion
    pub failed: usize,

    /// Times the worker drained the queue and went idle
    pub drains: usize,
}

impl QueueMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks that have run to an outcome
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Generate a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} enqueued, {} succeeded, {} failed, {} drains",
            self.enqueued, self.succeeded, self.failed, self.drains
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_and_summary() {
        let metrics = QueueMetrics {
            enqueued: 3,
            succeeded: 2,
            failed: 1,
            drains: 1,
        };
        assert_eq!(metrics.finished(), 3);
        assert_eq!(metrics.summary(), "3 enqueued, 2 succeeded, 1 failed, 1 drains");
    }
}
