//! Error types for the provider service

use crate::config::ConfigError;
use crate::source::SourceError;
use thiserror::Error;

/// Provider error
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Document could not be fetched
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The service loop is no longer running
    #[error("Provider service stopped")]
    ServiceStopped,
}
