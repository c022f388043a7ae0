//! Deltafeed Extractor
//!
//! Turns JSON documents into [`Item`](deltafeed_domain::Item)s according to a
//! declarative [`FieldMapping`](deltafeed_domain::FieldMapping).
//!
//! # Overview
//!
//! Extraction is a pure function of the document, the mapping and the process
//! start time. Nothing here tracks what was seen before; freshness and
//! delivery live in `deltafeed-tracker`.
//!
//! # Architecture
//!
//! ```text
//! Document → locate root array → map each record → resolve timestamp → Items
//! ```
//!
//! A document whose root key is missing, does not hold an array, or holds an
//! empty array is a source defect and fails as a whole. A record that cannot
//! be mapped is a [`Rejection`]: it is logged and skipped, and the remaining
//! records are still extracted.
//!
//! # Example Usage
//!
//! ```
//! use chrono::Utc;
//! use deltafeed_domain::{FieldMapping, ValueType, TimestampSpec};
//! use deltafeed_extractor::extract_items;
//! use serde_json::json;
//!
//! let doc = json!({"readings": [
//!     {"name": "cpu", "val": "42.5", "ts": "2024-01-01T00:00:00Z"},
//! ]});
//!
//! let mut mapping = FieldMapping::new("name", "load", "val");
//! mapping.root_key = "readings".to_string();
//! mapping.value_type = ValueType::Numeric;
//! mapping.timestamp = TimestampSpec::Field("ts".to_string());
//!
//! let result = extract_items(&doc, &mapping, Utc::now()).unwrap();
//! assert_eq!(result.items.len(), 1);
//! assert_eq!(result.items[0].value.as_f64(), Some(42.5));
//! ```

#![warn(missing_docs)]

mod document;
mod error;
mod mapper;
mod sink;
mod timestamp;
mod types;


pub use document::{extract_items, locate_array, locate_records, parse_document};
pub use error::ExtractorError;
pub use mapper::{map_record, try_map_record, Rejection};
pub use sink::{render_items, write_items};
pub use timestamp::{offset_timestamp, parse_lenient, parse_strict, resolve_timestamp, TimestampError};
pub use types::{ExtractionFailure, ExtractionResult};
