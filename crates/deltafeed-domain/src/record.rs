//! Ordered key/value view over one raw JSON record

use serde_json::{Map, Value};

/// Outcome of looking up a configured key in a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// Key not present
    Absent,
    /// Key present with an explicit `null`
    Null,
    /// Key present with a non-null value
    Present(&'a Value),
}

impl<'a> Lookup<'a> {
    /// The value, if present and non-null
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Lookup::Present(value) => Some(value),
            Lookup::Absent | Lookup::Null => None,
        }
    }

    /// Short description used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Lookup::Absent => "absent",
            Lookup::Null => "null",
            Lookup::Present(_) => "present",
        }
    }
}

/// One raw record from the located array
///
/// Keys keep document order (serde_json `preserve_order`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// View a JSON value as a record; non-objects have no fields
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(|fields| Self(fields.clone()))
    }

    /// Look up `key`, distinguishing absent from null
    pub fn lookup(&self, key: &str) -> Lookup<'_> {
        match self.0.get(key) {
            None => Lookup::Absent,
            Some(Value::Null) => Lookup::Null,
            Some(value) => Lookup::Present(value),
        }
    }

    /// Look up `key` and render a scalar as text
    ///
    /// Strings are returned as-is, numbers and booleans via their JSON text.
    /// Arrays and objects are a type mismatch and yield `Err` with the kind.
    pub fn text(&self, key: &str) -> Result<Option<String>, &'static str> {
        match self.lookup(key).value() {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(Value::Array(_)) => Err("array"),
            Some(Value::Object(_)) => Err("object"),
            Some(Value::Null) => Ok(None),
        }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate field names in document order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
