//! Field mappings and provider configuration
//!
//! A [`FieldMapping`] describes how the records under one root key become
//! items; a [`ProviderConfig`] groups the mappings of one provider together
//! with its consumers and timings.
//!
//! Required keys (`subject_key`, `value_key`) default to empty strings when
//! absent from the configuration: an unresolvable key rejects each item at
//! mapping time instead of failing the whole configuration.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Format accepted for a literal minimum age
pub const MINIMUM_AGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How the raw value is carried into the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Keep the raw value unchanged
    #[default]
    String,
    /// Parse the raw value as a finite floating-point number
    Numeric,
}

/// Where an item's timestamp comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampSpec {
    /// Signed offset in seconds from process start; the record is not consulted
    Offset(i64),
    /// Name of the record field holding the timestamp
    Field(String),
}

impl Default for TimestampSpec {
    fn default() -> Self {
        TimestampSpec::Offset(0)
    }
}

/// Freshness threshold used to seed a source's high-water-mark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinimumAge {
    /// Number of minutes before "now"
    Minutes(i64),
    /// Either `today` (local midnight) or a `YYYY-MM-DD HH:MM:SS` local timestamp
    Label(String),
}

impl Default for MinimumAge {
    fn default() -> Self {
        MinimumAge::Label("today".to_string())
    }
}

impl MinimumAge {
    /// Resolve the threshold relative to `now`
    ///
    /// # Errors
    /// Returns the offending label when it is neither `today` nor a timestamp
    /// in [`MINIMUM_AGE_FORMAT`], or the minute count when it falls outside
    /// the representable range.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, Local, Utc};
    /// use deltafeed_domain::MinimumAge;
    ///
    /// let now = Local::now();
    /// let mark = MinimumAge::Minutes(30).resolve(now).unwrap();
    /// assert_eq!(mark, (now - Duration::minutes(30)).with_timezone(&Utc));
    /// ```
    pub fn resolve(&self, now: DateTime<Local>) -> Result<DateTime<Utc>, String> {
        match self {
            MinimumAge::Minutes(minutes) => chrono::Duration::try_minutes(*minutes)
                .and_then(|age| now.checked_sub_signed(age))
                .map(|mark| mark.with_timezone(&Utc))
                .ok_or_else(|| minutes.to_string()),
            MinimumAge::Label(label) if label.eq_ignore_ascii_case("today") => {
                let midnight = now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
                Ok(Local
                    .from_local_datetime(&midnight)
                    .earliest()
                    .unwrap_or(now)
                    .with_timezone(&Utc))
            }
            MinimumAge::Label(label) => NaiveDateTime::parse_from_str(label, MINIMUM_AGE_FORMAT)
                .ok()
                .and_then(|naive| Local.from_local_datetime(&naive).earliest())
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| label.clone()),
        }
    }
}

/// Declarative description of one feed: how records become items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Optional short name of the feed
    #[serde(default)]
    pub feed_name: Option<String>,

    /// Human-readable title, sent as `source.title` with deliveries
    #[serde(default)]
    pub feed_title: String,

    /// Locator overriding the provider-level input for this feed
    #[serde(default)]
    pub input: Option<String>,

    /// Key locating the record array in the document; empty means the
    /// document itself is the array
    #[serde(default)]
    pub root_key: String,

    /// Record key holding the subject
    #[serde(default)]
    pub subject_key: String,

    /// Constant object literal copied into every item
    #[serde(default)]
    pub object_literal: String,

    /// Record key holding the value
    #[serde(default)]
    pub value_key: String,

    /// How the value is carried
    #[serde(default)]
    pub value_type: ValueType,

    /// Record key or runtime offset for the timestamp
    #[serde(default)]
    pub timestamp: TimestampSpec,

    /// Strict chrono format for the timestamp field
    #[serde(default)]
    pub timestamp_format: Option<String>,

    /// File receiving the admitted items of each cycle
    #[serde(default)]
    pub output_sink: Option<PathBuf>,

    /// Seed for the high-water-mark
    #[serde(default)]
    pub minimum_age: MinimumAge,
}

impl FieldMapping {
    /// Create a mapping with the given keys and defaults for everything else
    pub fn new(
        subject_key: impl Into<String>,
        object_literal: impl Into<String>,
        value_key: impl Into<String>,
    ) -> Self {
        Self {
            feed_name: None,
            feed_title: String::new(),
            input: None,
            root_key: String::new(),
            subject_key: subject_key.into(),
            object_literal: object_literal.into(),
            value_key: value_key.into(),
            value_type: ValueType::default(),
            timestamp: TimestampSpec::default(),
            timestamp_format: None,
            output_sink: None,
            minimum_age: MinimumAge::default(),
        }
    }

    /// Title used when reporting this feed
    pub fn title(&self) -> &str {
        if self.feed_title.is_empty() {
            self.feed_name.as_deref().unwrap_or(&self.root_key)
        } else {
            &self.feed_title
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    60 * 60 * 1000
}

fn default_queue_pacing_ms() -> u64 {
    10
}

/// Configuration of one provider instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider id carried in delivery pushes
    pub id: crate::ProviderId,

    /// Default input locator (filesystem path or http(s) URL)
    #[serde(default)]
    pub input: Option<String>,

    /// Consumers this provider serves; readiness from anyone else is ignored
    #[serde(default)]
    pub consumer_ids: Vec<crate::ConsumerId>,

    /// Delivery-cycle repeat interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay between queued tasks in milliseconds
    #[serde(default = "default_queue_pacing_ms")]
    pub queue_pacing_ms: u64,

    /// Feeds, processed in this order
    #[serde(default)]
    pub feeds: Vec<FieldMapping>,
}

impl ProviderConfig {
    /// Create a configuration with default timings and no feeds
    pub fn new(id: impl Into<crate::ProviderId>) -> Self {
        Self {
            id: id.into(),
            input: None,
            consumer_ids: Vec::new(),
            poll_interval_ms: default_poll_interval_ms(),
            queue_pacing_ms: default_queue_pacing_ms(),
            feeds: Vec::new(),
        }
    }

    /// Poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Queue pacing as Duration
    pub fn queue_pacing(&self) -> Duration {
        Duration::from_millis(self.queue_pacing_ms)
    }

    /// Whether `consumer` is on this provider's allow-list
    pub fn serves(&self, consumer: &crate::ConsumerId) -> bool {
        self.consumer_ids.contains(consumer)
    }

    /// Locator for the feed at `index`, falling back to the provider input
    pub fn input_for(&self, index: usize) -> Option<&str> {
        self.feeds
            .get(index)
            .and_then(|feed| feed.input.as_deref())
            .or(self.input.as_deref())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }
        for (idx, feed) in self.feeds.iter().enumerate() {
            if feed.input.is_none() && self.input.is_none() {
                return Err(format!("feed {} ('{}') has no input locator", idx, feed.title()));
            }
            if let MinimumAge::Minutes(minutes) = feed.minimum_age {
                if feed.minimum_age.resolve(Local::now()).is_err() {
                    return Err(format!(
                        "feed {} ('{}') has an out-of-range minimum_age of {} minutes",
                        idx,
                        feed.title(),
                        minutes
                    ));
                }
            }
            if let TimestampSpec::Offset(seconds) = feed.timestamp {
                let in_range = chrono::Duration::try_seconds(seconds)
                    .and_then(|offset| Utc::now().checked_add_signed(offset))
                    .is_some();
                if !in_range {
                    return Err(format!(
                        "feed {} ('{}') has an out-of-range timestamp offset of {} seconds",
                        idx,
                        feed.title(),
                        seconds
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_mapping_defaults_from_json() {
        let mapping: FieldMapping = serde_json::from_str(
            r#"{"subject_key": "name", "object_literal": "cpu", "value_key": "val"}"#,
        )
        .unwrap();

        assert_eq!(mapping.root_key, "");
        assert_eq!(mapping.value_type, ValueType::String);
        assert_eq!(mapping.timestamp, TimestampSpec::Offset(0));
        assert_eq!(mapping.timestamp_format, None);
        assert_eq!(mapping.output_sink, None);
        assert_eq!(mapping.minimum_age, MinimumAge::Label("today".to_string()));
    }

    #[test]
    fn test_timestamp_spec_untagged() {
        let offset: TimestampSpec = serde_json::from_str("-60").unwrap();
        assert_eq!(offset, TimestampSpec::Offset(-60));

        let field: TimestampSpec = serde_json::from_str("\"ts\"").unwrap();
        assert_eq!(field, TimestampSpec::Field("ts".to_string()));
    }

    #[test]
    fn test_missing_required_keys_default_to_empty() {
        let mapping: FieldMapping = serde_json::from_str(r#"{"value_key": "val"}"#).unwrap();
        assert_eq!(mapping.subject_key, "");
    }

    #[test]
    fn test_minimum_age_minutes() {
        let now = Local::now();
        let mark = MinimumAge::Minutes(90).resolve(now).unwrap();
        assert_eq!(mark, (now - chrono::Duration::minutes(90)).with_timezone(&Utc));
    }

    #[test]
    fn test_minimum_age_out_of_range_minutes() {
        let now = Local::now();
        assert_eq!(
            MinimumAge::Minutes(200_000_000_000).resolve(now),
            Err("200000000000".to_string())
        );
        assert!(MinimumAge::Minutes(i64::MIN).resolve(now).is_err());
    }

    #[test]
    fn test_minimum_age_today_is_local_midnight() {
        let now = Local::now();
        let mark = MinimumAge::Label("Today".to_string()).resolve(now).unwrap();
        let local = mark.with_timezone(&Local);

        assert_eq!(local.date_naive(), now.date_naive());
        assert_eq!(local.hour(), 0);
        assert_eq!(local.minute(), 0);
        assert_eq!(local.second(), 0);
    }

    #[test]
    fn test_minimum_age_literal() {
        let mark = MinimumAge::Label("2024-03-05 06:07:08".to_string())
            .resolve(Local::now())
            .unwrap();
        let local = mark.with_timezone(&Local);
        assert_eq!((local.year(), local.month(), local.day()), (2024, 3, 5));
        assert_eq!((local.hour(), local.minute(), local.second()), (6, 7, 8));
    }

    #[test]
    fn test_minimum_age_invalid_label() {
        let result = MinimumAge::Label("last tuesday".to_string()).resolve(Local::now());
        assert_eq!(result, Err("last tuesday".to_string()));
    }

    #[test]
    fn test_provider_config_defaults() {
        let config: ProviderConfig = serde_json::from_str(r#"{"id": "MMFP1"}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(3600));
        assert_eq!(config.queue_pacing(), Duration::from_millis(10));
        assert!(config.feeds.is_empty());
    }

    #[test]
    fn test_input_for_prefers_feed_override() {
        let mut config = ProviderConfig::new("p");
        config.input = Some("./default.json".to_string());

        let mut feed = FieldMapping::new("name", "cpu", "val");
        config.feeds.push(feed.clone());
        feed.input = Some("./override.json".to_string());
        config.feeds.push(feed);

        assert_eq!(config.input_for(0), Some("./default.json"));
        assert_eq!(config.input_for(1), Some("./override.json"));
        assert_eq!(config.input_for(2), Some("./default.json"));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = ProviderConfig::new("p");
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_durations() {
        let mut config = ProviderConfig::new("p");
        config.input = Some("./input.json".to_string());

        let mut feed = FieldMapping::new("name", "cpu", "val");
        feed.minimum_age = MinimumAge::Minutes(200_000_000_000);
        config.feeds.push(feed);
        assert!(config.validate().unwrap_err().contains("minimum_age"));

        config.feeds[0].minimum_age = MinimumAge::Minutes(30);
        config.feeds[0].timestamp = TimestampSpec::Offset(i64::MAX);
        assert!(config.validate().unwrap_err().contains("timestamp offset"));

        config.feeds[0].timestamp = TimestampSpec::Offset(10_000_000_000_000);
        assert!(config.validate().is_err());

        config.feeds[0].timestamp = TimestampSpec::Offset(-60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_input() {
        let mut config = ProviderConfig::new("p");
        config.feeds.push(FieldMapping::new("name", "cpu", "val"));
        assert!(config.validate().is_err());

        config.input = Some("./input.json".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_title_fallbacks() {
        let mut mapping = FieldMapping::new("name", "cpu", "val");
        mapping.root_key = "readings".to_string();
        assert_eq!(mapping.title(), "readings");

        mapping.feed_name = Some("cpu-feed".to_string());
        assert_eq!(mapping.title(), "cpu-feed");

        mapping.feed_title = "CPU".to_string();
        assert_eq!(mapping.title(), "CPU");
    }
}
