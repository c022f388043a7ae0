//! Error types for tracking state

use deltafeed_domain::ProviderInstanceId;
use thiserror::Error;

/// Errors that can occur while managing tracking state
#[derive(Error, Debug)]
pub enum TrackerError {
    /// No configuration installed for this provider instance
    #[error("No configuration installed for provider instance: {0}")]
    UnknownInstance(ProviderInstanceId),

    /// Configuration rejected at install time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Source index outside the installed feeds
    #[error("Source index {index} out of range ({count} sources)")]
    UnknownSource {
        /// Requested index
        index: usize,
        /// Number of configured sources
        count: usize,
    },

    /// Status snapshot could not be rendered
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
