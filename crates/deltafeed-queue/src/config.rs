//! Configuration for the processing queue

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`ProcessingQueue`](crate::ProcessingQueue)
///
/// # Examples
///
/// ```
/// use deltafeed_queue::QueueConfig;
///
/// let config = QueueConfig::default();
/// assert_eq!(config.pacing_ms, 10);
///
/// let config = QueueConfig::with_pacing_ms(250);
/// assert_eq!(config.pacing().as_millis(), 250);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Delay between the end of one task and the start of the next (milliseconds)
    /// Default: 10
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

fn default_pacing_ms() -> u64 {
    10
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl QueueConfig {
    /// Configuration with the given pacing delay
    pub fn with_pacing_ms(pacing_ms: u64) -> Self {
        Self { pacing_ms }
    }

    /// Pacing delay as Duration
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}
