//! Document sources: where feed documents come from
//!
//! `http://` and `https://` locators are fetched over the network; anything
//! else is a filesystem path.

use async_trait::async_trait;
use deltafeed_extractor::{parse_document, ExtractorError};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors fetching a document
#[derive(Debug, Error)]
pub enum SourceError {
    /// Filesystem read failed
    #[error("Failed to read '{locator}': {source}")]
    Io {
        /// Path that was read
        locator: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Network fetch failed or returned an error status
    #[error("Failed to fetch '{locator}': {reason}")]
    Http {
        /// URL that was fetched
        locator: String,
        /// Failure description
        reason: String,
    },

    /// The body was not valid JSON
    #[error("Invalid document at '{locator}': {source}")]
    Parse {
        /// Locator of the document
        locator: String,
        /// Parse failure
        source: ExtractorError,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Something that can turn a locator into a parsed JSON document
#[async_trait]
pub trait DocumentSource: Send + Sync + 'static {
    /// Fetch and parse the document at `locator`
    async fn fetch(&self, locator: &str) -> Result<Value, SourceError>;
}

/// Whether `locator` names a network resource
pub fn is_remote(locator: &str) -> bool {
    let lower = locator.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolves locators against the filesystem or over HTTP
#[derive(Debug, Clone)]
pub struct LocatorSource {
    client: reqwest::Client,
}

impl LocatorSource {
    /// Create a source with the default request timeout
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a source with the given request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch_remote(&self, locator: &str) -> Result<Vec<u8>, SourceError> {
        let http_error = |e: reqwest::Error| SourceError::Http {
            locator: locator.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(locator)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_error)?;

        let body = response.bytes().await.map_err(http_error)?;
        Ok(body.to_vec())
    }

    async fn fetch_local(&self, locator: &str) -> Result<Vec<u8>, SourceError> {
        tokio::fs::read(locator).await.map_err(|source| SourceError::Io {
            locator: locator.to_string(),
            source,
        })
    }
}

#[async_trait]
impl DocumentSource for LocatorSource {
    async fn fetch(&self, locator: &str) -> Result<Value, SourceError> {
        let bytes = if is_remote(locator) {
            self.fetch_remote(locator).await?
        } else {
            self.fetch_local(locator).await?
        };
        debug!(locator, bytes = bytes.len(), "Fetched document");

        parse_document(&bytes).map_err(|source| SourceError::Parse {
            locator: locator.to_string(),
            source,
        })
    }
}
