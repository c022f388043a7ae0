//! Error types for the Extractor

use thiserror::Error;

/// Errors that stop extraction of a whole source
///
/// Individual records that fail mapping are not errors; see
/// [`Rejection`](crate::Rejection).
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The configured root key is not present in the document
    #[error("Root key '{0}' not found in document")]
    MissingRoot(String),

    /// The root key does not hold an array
    #[error("Root key '{0}' does not hold an array")]
    NotAnArray(String),

    /// The located array has no entries
    #[error("JSON array at root key '{0}' is empty")]
    EmptyRoot(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// File sink or input I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

impl ExtractorError {
    /// Whether this is a defect of the source document rather than of I/O
    pub fn is_source_defect(&self) -> bool {
        matches!(
            self,
            ExtractorError::MissingRoot(_) | ExtractorError::NotAnArray(_) | ExtractorError::EmptyRoot(_)
        )
    }
}
