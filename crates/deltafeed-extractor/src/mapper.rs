//! Field mapper: one raw record plus one mapping gives zero or one item

use crate::timestamp::{resolve_timestamp, TimestampError};
use chrono::{DateTime, Utc};
use deltafeed_domain::{FieldMapping, Item, ItemValue, Lookup, Record, ValueType};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Why a record did not become an item
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    /// Array entry is not a JSON object
    #[error("record is not a JSON object")]
    NotAnObject,

    /// Subject key absent or null
    #[error("subject '{key}' is {state}")]
    MissingSubject {
        /// Configured subject key
        key: String,
        /// `absent` or `null`
        state: &'static str,
    },

    /// Subject is an array or object
    #[error("subject '{key}' is an {kind}, expected a scalar")]
    SubjectType {
        /// Configured subject key
        key: String,
        /// JSON kind found
        kind: &'static str,
    },

    /// Value key absent or null
    #[error("value '{key}' is {state}")]
    MissingValue {
        /// Configured value key
        key: String,
        /// `absent` or `null`
        state: &'static str,
    },

    /// Numeric output requested but the value is not a finite number
    #[error("Invalid numeric value: {0}")]
    InvalidNumber(String),

    /// Timestamp could not be resolved
    #[error(transparent)]
    InvalidDate(#[from] TimestampError),
}

/// Map a record, reporting why it was rejected
pub fn try_map_record(
    record: &Record,
    mapping: &FieldMapping,
    runtime: DateTime<Utc>,
) -> Result<Item, Rejection> {
    let subject = match record.text(&mapping.subject_key) {
        Ok(Some(subject)) => subject,
        Ok(None) => {
            return Err(Rejection::MissingSubject {
                key: mapping.subject_key.clone(),
                state: record.lookup(&mapping.subject_key).describe(),
            })
        }
        Err(kind) => {
            return Err(Rejection::SubjectType {
                key: mapping.subject_key.clone(),
                kind,
            })
        }
    };

    let raw_value = match record.lookup(&mapping.value_key) {
        Lookup::Present(value) => value,
        missing => {
            return Err(Rejection::MissingValue {
                key: mapping.value_key.clone(),
                state: missing.describe(),
            })
        }
    };

    let value = match mapping.value_type {
        ValueType::Numeric => ItemValue::Numeric(parse_numeric(raw_value)?),
        ValueType::String => ItemValue::Raw(raw_value.clone()),
    };

    let timestamp = resolve_timestamp(record, mapping, runtime)?;

    Ok(Item {
        subject,
        object: mapping.object_literal.clone(),
        value,
        timestamp,
    })
}

/// Map a record into an item, or `None` when it must be skipped
///
/// Rejections are logged; the input is never modified.
pub fn map_record(record: &Record, mapping: &FieldMapping, runtime: DateTime<Utc>) -> Option<Item> {
    match try_map_record(record, mapping, runtime) {
        Ok(item) => Some(item),
        Err(rejection) => {
            warn!(feed = mapping.title(), "Record rejected: {}", rejection);
            None
        }
    }
}

/// Parse a raw value as a finite f64, rejecting partial matches like `3.14abc`
fn parse_numeric(raw: &Value) -> Result<f64, Rejection> {
    let invalid = || Rejection::InvalidNumber(match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(invalid)?;

    if number.is_finite() {
        Ok(number)
    } else {
        Err(invalid())
    }
}
