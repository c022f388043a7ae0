//! File sink: serialize an item array to a file, overwriting it

use crate::error::ExtractorError;
use deltafeed_domain::Item;
use std::path::Path;
use tracing::info;

/// Write `items` as a JSON array to `path`, replacing any existing content
pub fn write_items(path: &Path, items: &[Item]) -> Result<(), ExtractorError> {
    let json = serde_json::to_vec_pretty(items)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), items = items.len(), "Wrote items to sink");
    Ok(())
}

/// Render `items` as a pretty JSON array for console output
pub fn render_items(items: &[Item]) -> Result<String, ExtractorError> {
    Ok(serde_json::to_string_pretty(items)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use deltafeed_domain::ItemValue;

    fn item(subject: &str) -> Item {
        Item::new(
            subject,
            "load",
            ItemValue::Numeric(1.0),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_items(&path, &[item("a"), item("b")]).unwrap();
        write_items(&path, &[item("c")]).unwrap();

        let written: Vec<Item> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, vec![item("c")]);
    }

    #[test]
    fn test_write_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_items(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.json");
        assert!(matches!(write_items(&path, &[item("a")]), Err(ExtractorError::Io(_))));
    }
}
