//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use deltafeed_domain::{FieldMapping, Item, ItemValue};
use deltafeed_extractor::render_items;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format extracted items.
    pub fn format_items(&self, items: &[Item]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(render_items(items)?),
            OutputFormat::Table => Ok(self.format_items_table(items)),
        }
    }

    fn format_items_table(&self, items: &[Item]) -> String {
        if items.is_empty() {
            return self.colorize("No items extracted.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Subject", "Object", "Value", "Timestamp"]);

        for item in items {
            builder.push_record([
                item.subject.clone(),
                item.object.clone(),
                format_value(&item.value),
                item.timestamp.to_rfc3339(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format the feeds of a mapping file.
    pub fn format_feeds(&self, feeds: &[FieldMapping]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(feeds)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Feed", "Root", "Subject", "Object", "Value", "Type", "Sink"]);

        for feed in feeds {
            let value_type = serde_json::to_value(&feed.value_type)?;
            builder.push_record([
                feed.title().to_string(),
                feed.root_key.clone(),
                feed.subject_key.clone(),
                feed.object_literal.clone(),
                feed.value_key.clone(),
                value_type.as_str().unwrap_or_default().to_string(),
                feed.output_sink
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        Ok(table.to_string())
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn format_value(value: &ItemValue) -> String {
    match value {
        ItemValue::Numeric(n) => n.to_string(),
        ItemValue::Raw(serde_json::Value::String(s)) => s.clone(),
        ItemValue::Raw(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn items() -> Vec<Item> {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        vec![
            Item::new("cpu", "load", ItemValue::Numeric(42.5), ts),
            Item::new("front", "door", ItemValue::Raw(json!("open")), ts),
        ]
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_items(&items()).unwrap();
        let parsed: Vec<Item> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, items());
    }

    #[test]
    fn test_json_empty_is_array() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        assert_eq!(formatter.format_items(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_items(&items()).unwrap();
        assert!(output.contains("Subject"));
        assert!(output.contains("42.5"));
        assert!(output.contains("open"));
        assert!(!output.contains("\"open\""));
    }

    #[test]
    fn test_empty_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_items(&[]).unwrap();
        assert!(output.contains("No items extracted"));
    }

    #[test]
    fn test_feeds_table() {
        let mut feed = FieldMapping::new("name", "load", "val");
        feed.feed_title = "CPU load".to_string();
        feed.root_key = "readings".to_string();

        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_feeds(&[feed]).unwrap();
        assert!(output.contains("CPU load"));
        assert!(output.contains("readings"));
        assert!(output.contains("string"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("bad"), "✗ bad");
    }
}
