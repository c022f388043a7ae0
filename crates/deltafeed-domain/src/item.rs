//! Item module - the canonical unit produced by extraction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an admitted item based on UUIDv7
///
/// Assigned when the freshness filter admits an item, so ordering by id
/// follows admission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u128);

impl ItemId {
    /// Generate a new UUIDv7-based ItemId
    ///
    /// # Examples
    ///
    /// ```
    /// use deltafeed_domain::ItemId;
    ///
    /// let id = ItemId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an ItemId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an ItemId from its hyphenated string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid item id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for ItemId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ItemId::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// The value carried by an item
///
/// `Numeric` is produced when the mapping asks for numeric output and the raw
/// value parsed as a finite number. `Raw` keeps the record's value unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    /// Parsed floating-point value
    Numeric(f64),
    /// The raw JSON value, as found in the record
    Raw(serde_json::Value),
}

impl ItemValue {
    /// The numeric value, if this is a numeric item
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ItemValue::Numeric(n) => Some(*n),
            ItemValue::Raw(_) => None,
        }
    }
}

/// An extracted subject/object/value/timestamp tuple
///
/// Only ever constructed once subject, value and timestamp have all been
/// found and validated; there is no partially-filled item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Subject read from the record's subject key
    pub subject: String,

    /// Constant object literal from the field mapping
    pub object: String,

    /// Value read from the record's value key
    pub value: ItemValue,

    /// Resolved point in time
    pub timestamp: DateTime<Utc>,
}

impl Item {
    /// Create a new item
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        value: ItemValue,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            value,
            timestamp,
        }
    }
}
