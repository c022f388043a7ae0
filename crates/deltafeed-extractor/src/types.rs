//! Result types for extraction

use crate::mapper::Rejection;
use deltafeed_domain::Item;

/// Result of extracting one feed from one document
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// Items that passed mapping, in record order
    pub items: Vec<Item>,

    /// Records that were rejected, with the reason
    pub failures: Vec<ExtractionFailure>,

    /// Number of records in the located array
    pub records_seen: usize,
}

impl ExtractionResult {
    /// Number of rejected records
    pub fn rejected(&self) -> usize {
        self.failures.len()
    }
}

/// A record that did not become an item
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFailure {
    /// Position of the record in the located array
    pub index: usize,

    /// Why it was rejected
    pub reason: Rejection,
}
