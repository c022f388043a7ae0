//! Configuration file parsing for the provider binary.
//!
//! Loads one or more provider instances from TOML, each a full
//! [`ProviderConfig`] plus the instance id it is installed under.

use deltafeed_domain::{ConsumerId, ProviderConfig, ProviderInstanceId};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Provider configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A provider entry failed validation
    #[error("Invalid provider '{instance}': {reason}")]
    Invalid {
        /// Offending instance
        instance: String,
        /// Validation failure
        reason: String,
    },
}

/// Provider binary settings loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Consumers the binary announces as ready and prints deliveries for
    #[serde(default)]
    pub console_consumers: Vec<ConsumerId>,

    /// Provider instances to install
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

/// One `[[providers]]` table
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    /// Instance id; defaults to the provider id
    #[serde(default)]
    pub instance: Option<ProviderInstanceId>,

    /// The provider's configuration
    #[serde(flatten)]
    pub config: ProviderConfig,
}

impl ProviderEntry {
    /// Instance id this entry is installed under
    pub fn instance_id(&self) -> ProviderInstanceId {
        self.instance
            .clone()
            .unwrap_or_else(|| ProviderInstanceId::new(self.config.id.as_str()))
    }
}

impl ProviderSettings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings: ProviderSettings = toml::from_str(contents)?;

        if settings.providers.is_empty() {
            return Err(ConfigError::MissingField("providers".to_string()));
        }

        for entry in &settings.providers {
            entry.config.validate().map_err(|reason| ConfigError::Invalid {
                instance: entry.instance_id().to_string(),
                reason,
            })?;
        }

        Ok(settings)
    }
}
