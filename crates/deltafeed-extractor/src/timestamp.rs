//! Timestamp resolution for field mappings
//!
//! Rules, in priority order:
//! 1. A numeric offset resolves to `runtime + offset` without reading the record.
//! 2. Otherwise the named field must be present and non-null.
//! 3. With a format, the raw value must parse strictly against it.
//! 4. Without a format, a lenient parse is attempted.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use deltafeed_domain::{FieldMapping, Record, TimestampSpec};
use serde_json::Value;
use thiserror::Error;

/// Naive layouts tried by the lenient parser, interpreted in local time
const LENIENT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const LENIENT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Why a timestamp could not be resolved
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    /// The configured timestamp field is absent or null
    #[error("Invalid date: timestamp field '{0}' missing")]
    MissingField(String),

    /// The offset moves the runtime outside the representable range
    #[error("Invalid date: offset of {0} seconds is out of range")]
    OffsetOutOfRange(i64),

    /// The raw value did not parse
    #[error("Invalid date: {value}")]
    Unparseable {
        /// Raw value as found in the record
        value: String,
        /// Strict format, when one was configured
        format: Option<String>,
    },
}

/// Resolve the timestamp of `record` according to `mapping`
///
/// `runtime` is the process start time used for offset timestamps.
pub fn resolve_timestamp(
    record: &Record,
    mapping: &FieldMapping,
    runtime: DateTime<Utc>,
) -> Result<DateTime<Utc>, TimestampError> {
    let key = match &mapping.timestamp {
        TimestampSpec::Offset(seconds) => return offset_timestamp(runtime, *seconds),
        TimestampSpec::Field(key) => key,
    };

    let raw = record
        .lookup(key)
        .value()
        .ok_or_else(|| TimestampError::MissingField(key.clone()))?;

    match &mapping.timestamp_format {
        Some(format) => parse_strict(raw, format),
        None => parse_lenient(raw),
    }
}

/// `runtime` shifted by a signed number of seconds
pub fn offset_timestamp(runtime: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>, TimestampError> {
    chrono::Duration::try_seconds(seconds)
        .and_then(|offset| runtime.checked_add_signed(offset))
        .ok_or(TimestampError::OffsetOutOfRange(seconds))
}

/// Parse `raw` strictly against a chrono format string
///
/// Formats carrying an offset (`%z`, `%:z`) are honoured; formats without one
/// are read as local time, and date-only formats as local midnight.
pub fn parse_strict(raw: &Value, format: &str) -> Result<DateTime<Utc>, TimestampError> {
    let text = raw_text(raw);
    let invalid = || TimestampError::Unparseable {
        value: text.clone(),
        format: Some(format.to_string()),
    };

    if let Ok(dt) = DateTime::parse_from_str(&text, format) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&text, format) {
        return local_to_utc(naive).ok_or_else(invalid);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
        return date
            .and_hms_opt(0, 0, 0)
            .and_then(local_to_utc)
            .ok_or_else(invalid);
    }
    Err(invalid())
}

/// Parse `raw` with general-purpose rules
///
/// Numbers are epoch milliseconds. Strings may be RFC 3339, RFC 2822, or one of
/// the common naive layouts (read as local time).
pub fn parse_lenient(raw: &Value) -> Result<DateTime<Utc>, TimestampError> {
    let invalid = || TimestampError::Unparseable {
        value: raw_text(raw),
        format: None,
    };

    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(invalid),
        Value::String(s) => parse_lenient_str(s.trim()).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_lenient_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in LENIENT_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_to_utc(naive);
        }
    }
    for format in LENIENT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).and_then(local_to_utc);
        }
    }
    None
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(&value).unwrap()
    }

    fn runtime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, s)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_offset_ignores_record() {
        let mut mapping = FieldMapping::new("name", "cpu", "val");
        mapping.timestamp = TimestampSpec::Offset(-60);

        let ts = resolve_timestamp(&record(json!({"ts": "garbage"})), &mapping, runtime()).unwrap();
        assert_eq!(ts, runtime() - chrono::Duration::seconds(60));
    }

    #[test]
    fn test_offset_out_of_range_is_invalid_date() {
        let mut mapping = FieldMapping::new("name", "cpu", "val");
        for seconds in [i64::MAX, i64::MIN, 10_000_000_000_000] {
            mapping.timestamp = TimestampSpec::Offset(seconds);
            let result = resolve_timestamp(&record(json!({})), &mapping, runtime());
            assert_eq!(result, Err(TimestampError::OffsetOutOfRange(seconds)));
        }
    }

    #[test]
    fn test_default_offset_is_runtime() {
        let mapping = FieldMapping::new("name", "cpu", "val");
        let ts = resolve_timestamp(&record(json!({})), &mapping, runtime()).unwrap();
        assert_eq!(ts, runtime());
    }

    #[test]
    fn test_missing_field() {
        let mut mapping = FieldMapping::new("name", "cpu", "val");
        mapping.timestamp = TimestampSpec::Field("ts".to_string());

        let err = resolve_timestamp(&record(json!({"name": "cpu"})), &mapping, runtime()).unwrap_err();
        assert_eq!(err, TimestampError::MissingField("ts".to_string()));

        let err = resolve_timestamp(&record(json!({"ts": null})), &mapping, runtime()).unwrap_err();
        assert_eq!(err, TimestampError::MissingField("ts".to_string()));
    }

    #[test]
    fn test_lenient_rfc3339() {
        let ts = parse_lenient(&json!("2024-01-01T00:00:00Z")).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let ts = parse_lenient(&json!("2024-01-01T02:00:00+02:00")).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_lenient_rfc2822() {
        let ts = parse_lenient(&json!("Mon, 01 Jan 2024 00:00:00 +0000")).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_lenient_naive_is_local() {
        let ts = parse_lenient(&json!("2024-01-01 08:30:00")).unwrap();
        assert_eq!(ts, local(2024, 1, 1, 8, 30, 0));

        let ts = parse_lenient(&json!("2024-01-01")).unwrap();
        assert_eq!(ts, local(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_lenient_epoch_millis() {
        let ts = parse_lenient(&json!(1_704_067_200_000_i64)).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_lenient_rejects_garbage() {
        assert!(parse_lenient(&json!("not a date")).is_err());
        assert!(parse_lenient(&json!("")).is_err());
        assert!(parse_lenient(&json!(true)).is_err());
        assert!(parse_lenient(&json!({"at": 1})).is_err());
    }

    #[test]
    fn test_strict_format() {
        let ts = parse_strict(&json!("01/02/2024 10:15"), "%d/%m/%Y %H:%M").unwrap();
        assert_eq!(ts, local(2024, 2, 1, 10, 15, 0));

        let ts = parse_strict(&json!("2024-01-01 00:00:00 +0000"), "%Y-%m-%d %H:%M:%S %z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let ts = parse_strict(&json!("2024/03/15"), "%Y/%m/%d").unwrap();
        assert_eq!(ts, local(2024, 3, 15, 0, 0, 0));
    }

    #[test]
    fn test_strict_format_mismatch() {
        let err = parse_strict(&json!("2024-01-01T00:00:00Z"), "%d/%m/%Y").unwrap_err();
        assert_eq!(
            err,
            TimestampError::Unparseable {
                value: "2024-01-01T00:00:00Z".to_string(),
                format: Some("%d/%m/%Y".to_string()),
            }
        );
        assert!(err.to_string().starts_with("Invalid date"));
    }

    #[test]
    fn test_strict_used_when_format_configured() {
        let mut mapping = FieldMapping::new("name", "cpu", "val");
        mapping.timestamp = TimestampSpec::Field("ts".to_string());
        mapping.timestamp_format = Some("%d/%m/%Y".to_string());

        // Leniently valid, strictly not
        let result = resolve_timestamp(
            &record(json!({"ts": "2024-01-01T00:00:00Z"})),
            &mapping,
            runtime(),
        );
        assert!(result.is_err());
    }
}
