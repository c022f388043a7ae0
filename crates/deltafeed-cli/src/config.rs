//! Mapping file loading for the CLI.

use crate::error::{CliError, Result};
use deltafeed_domain::FieldMapping;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A standalone extraction configuration: one input and its feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Default input locator for feeds without their own
    #[serde(default)]
    pub input: Option<String>,

    /// Field mappings to run against the input
    #[serde(default)]
    pub feeds: Vec<FieldMapping>,
}

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty JSON array
    Json,
    /// Table format
    Table,
}

impl ExtractConfig {
    /// Load a mapping file; `.json` files are read as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: ExtractConfig = if is_json {
            serde_json::from_str(&contents)?
        } else {
            toml::from_str(&contents)?
        };

        if config.feeds.is_empty() {
            return Err(CliError::Config(format!(
                "No feeds defined in '{}'",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Locator for `feed`, preferring `override_input`, then the feed's own, then the file's.
    pub fn input_for<'a>(
        &'a self,
        feed: &'a FieldMapping,
        override_input: Option<&'a str>,
    ) -> Result<&'a str> {
        override_input
            .or(feed.input.as_deref())
            .or(self.input.as_deref())
            .ok_or_else(|| {
                CliError::Config(format!("Feed '{}' has no input locator", feed.title()))
            })
    }

    /// Feeds selected by name or title; all feeds when `selector` is `None`.
    pub fn select(&self, selector: Option<&str>) -> Result<Vec<&FieldMapping>> {
        let Some(wanted) = selector else {
            return Ok(self.feeds.iter().collect());
        };

        let selected: Vec<&FieldMapping> = self
            .feeds
            .iter()
            .filter(|feed| feed.feed_name.as_deref() == Some(wanted) || feed.title() == wanted)
            .collect();

        if selected.is_empty() {
            return Err(CliError::InvalidInput(format!("No feed named '{}'", wanted)));
        }
        Ok(selected)
    }
}
