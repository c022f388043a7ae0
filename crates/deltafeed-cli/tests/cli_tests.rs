//! Tests for standalone extraction against files on disk

use chrono::Utc;
use deltafeed_cli::cli::ExtractArgs;
use deltafeed_cli::commands::{execute_extract, extract_feeds};
use deltafeed_cli::{CliError, ExtractConfig, Formatter, OutputFormat};
use deltafeed_domain::{Item, ItemValue};
use deltafeed_extractor::ExtractorError;
use deltafeed_provider::LocatorSource;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DOCUMENT: &str = r#"{
    "readings": [
        {"name": "cpu", "val": "42.5", "ts": "2024-01-01T00:00:00Z"},
        {"name": "gpu", "val": "hot", "ts": "2024-01-01T00:00:00Z"}
    ],
    "doors": [
        {"id": "front", "state": "open"}
    ],
    "empty": []
}"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn setup(feeds: &str) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "data.json", DOCUMENT);
    let config = format!("input = {:?}\n{}", doc.to_str().unwrap(), feeds);
    let config = write(dir.path(), "feeds.toml", &config);
    (dir, doc, config)
}

const FEEDS: &str = r#"
[[feeds]]
feed_title = "CPU load"
root_key = "readings"
subject_key = "name"
object_literal = "load"
value_key = "val"
value_type = "numeric"
timestamp = "ts"

[[feeds]]
root_key = "doors"
subject_key = "id"
object_literal = "door"
value_key = "state"
"#;

#[tokio::test]
async fn test_extract_feeds_from_one_document() {
    let (_dir, _doc, config_path) = setup(FEEDS);
    let config = ExtractConfig::load(&config_path).unwrap();
    let feeds = config.select(None).unwrap();
    let source = LocatorSource::new().unwrap();

    let outputs = extract_feeds(&config, &feeds, None, &source, Utc::now()).await.unwrap();
    assert_eq!(outputs.len(), 2);

    let cpu = &outputs[0];
    assert_eq!(cpu.title, "CPU load");
    assert_eq!(cpu.items.len(), 1);
    assert_eq!(cpu.items[0].value, ItemValue::Numeric(42.5));
    assert_eq!(cpu.rejected, 1);

    let doors = &outputs[1];
    assert_eq!(doors.title, "doors");
    assert_eq!(doors.items[0].subject, "front");
    assert_eq!(doors.items[0].value, ItemValue::Raw(serde_json::json!("open")));
}

#[tokio::test]
async fn test_empty_root_is_fatal() {
    let feeds = r#"
[[feeds]]
root_key = "empty"
subject_key = "id"
value_key = "state"
"#;
    let (_dir, _doc, config_path) = setup(feeds);
    let config = ExtractConfig::load(&config_path).unwrap();
    let feeds = config.select(None).unwrap();
    let source = LocatorSource::new().unwrap();

    let result = extract_feeds(&config, &feeds, None, &source, Utc::now()).await;
    assert!(matches!(
        result,
        Err(CliError::Extraction(ExtractorError::EmptyRoot(_)))
    ));
}

#[tokio::test]
async fn test_missing_input_is_source_error() {
    let (dir, _doc, config_path) = setup(FEEDS);
    let config = ExtractConfig::load(&config_path).unwrap();
    let feeds = config.select(Some("CPU load")).unwrap();
    let source = LocatorSource::new().unwrap();

    let missing = dir.path().join("missing.json");
    let result = extract_feeds(
        &config,
        &feeds,
        Some(missing.to_str().unwrap()),
        &source,
        Utc::now(),
    )
    .await;
    assert!(matches!(result, Err(CliError::Source(_))));
}

#[tokio::test]
async fn test_input_override() {
    let (dir, _doc, config_path) = setup(FEEDS);
    let other = write(
        dir.path(),
        "other.json",
        r#"{"doors": [{"id": "back", "state": "closed"}]}"#,
    );

    let config = ExtractConfig::load(&config_path).unwrap();
    let feeds = config.select(Some("doors")).unwrap();
    let source = LocatorSource::new().unwrap();

    let outputs = extract_feeds(&config, &feeds, other.to_str(), &source, Utc::now())
        .await
        .unwrap();
    assert_eq!(outputs[0].items[0].subject, "back");
}

#[tokio::test]
async fn test_execute_extract_writes_sink() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "data.json", DOCUMENT);
    let sink = dir.path().join("doors-out.json");
    let config = format!(
        r#"
[[feeds]]
input = {:?}
root_key = "doors"
subject_key = "id"
object_literal = "door"
value_key = "state"
output_sink = {:?}
"#,
        doc.to_str().unwrap(),
        sink.to_str().unwrap()
    );
    let config_path = write(dir.path(), "feeds.toml", &config);

    let args = ExtractArgs {
        config: config_path,
        input: None,
        feed: None,
    };
    let formatter = Formatter::new(OutputFormat::Json, false);
    execute_extract(args, &formatter).await.unwrap();

    let written: Vec<Item> = serde_json::from_slice(&fs::read(&sink).unwrap()).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].subject, "front");
    assert_eq!(written[0].object, "door");
}

#[tokio::test]
async fn test_execute_extract_unknown_feed() {
    let (_dir, _doc, config_path) = setup(FEEDS);
    let args = ExtractArgs {
        config: config_path,
        input: None,
        feed: Some("nope".to_string()),
    };
    let formatter = Formatter::new(OutputFormat::Json, false);
    let result = execute_extract(args, &formatter).await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}
