//! Locate the record array in a document and run the mapper over it

use crate::error::ExtractorError;
use crate::mapper::{try_map_record, Rejection};
use crate::types::{ExtractionFailure, ExtractionResult};
use chrono::{DateTime, Utc};
use deltafeed_domain::{FieldMapping, Record};
use serde_json::Value;
use tracing::{debug, warn};

/// Parse a document from raw bytes
pub fn parse_document(bytes: &[u8]) -> Result<Value, ExtractorError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Find the array of entries under `root_key`
///
/// An empty key means the document itself is the array. Only the first level
/// is searched.
pub fn locate_array<'a>(document: &'a Value, root_key: &str) -> Result<&'a [Value], ExtractorError> {
    let located = if root_key.is_empty() {
        document
    } else {
        document
            .get(root_key)
            .ok_or_else(|| ExtractorError::MissingRoot(root_key.to_string()))?
    };

    let entries = located
        .as_array()
        .ok_or_else(|| ExtractorError::NotAnArray(root_key.to_string()))?;

    if entries.is_empty() {
        return Err(ExtractorError::EmptyRoot(root_key.to_string()));
    }
    Ok(entries)
}

/// Locate the array and view each entry as a record
///
/// Entries that are not objects come back as `None` in their position.
pub fn locate_records(document: &Value, root_key: &str) -> Result<Vec<Option<Record>>, ExtractorError> {
    Ok(locate_array(document, root_key)?
        .iter()
        .map(Record::from_value)
        .collect())
}

/// Extract every item `mapping` yields from `document`
///
/// Source defects (missing root, not an array, empty array) are errors;
/// per-record rejections are collected in the result and logged.
pub fn extract_items(
    document: &Value,
    mapping: &FieldMapping,
    runtime: DateTime<Utc>,
) -> Result<ExtractionResult, ExtractorError> {
    let records = locate_records(document, &mapping.root_key)?;

    let mut result = ExtractionResult {
        records_seen: records.len(),
        ..Default::default()
    };

    for (index, record) in records.iter().enumerate() {
        let outcome = match record {
            Some(record) => try_map_record(record, mapping, runtime),
            None => Err(Rejection::NotAnObject),
        };

        match outcome {
            Ok(item) => result.items.push(item),
            Err(reason) => {
                warn!(feed = mapping.title(), index, "Record rejected: {}", reason);
                result.failures.push(ExtractionFailure { index, reason });
            }
        }
    }

    debug!(
        feed = mapping.title(),
        records = result.records_seen,
        items = result.items.len(),
        rejected = result.rejected(),
        "Extraction complete"
    );

    Ok(result)
}
