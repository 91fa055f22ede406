//! Application configuration loading from config.toml
//!
//! Settings come from a TOML file (default `./config.toml`, overridable through `CONFIG_PATH`).
//! A handful of values can be overridden from the environment, which `dotenvy` may have
//! populated from a `.env` file. A missing file is not an error; every section has defaults
//! except the confirmation secret, which must come from somewhere.

use crate::{
    errors::{Error, Result},
    gate::ConfirmationSecret,
};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Confirmation gate settings
    pub gate: GateConfig,
    /// Record store settings
    pub store: StoreConfig,
    /// Spreadsheet export settings
    pub export: ExportConfig,
}

/// `[gate]` section
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Shared password required before add/edit/delete
    pub confirmation_secret: Option<String>,
}

/// `[store]` section
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// SeaORM connection URL
    pub database_url: String,
    /// Seconds between change polls; 0 disables polling
    pub poll_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/warehouse.sqlite?mode=rwc".to_string(),
            poll_interval_secs: 5,
        }
    }
}

/// `[export]` section
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// `chrono` format string for calendar dates in exported tables
    pub date_format: String,
    /// Prefix of the generated file name
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            date_format: "%d.%m.%Y".to_string(),
            file_prefix: "warehouse_data".to_string(),
        }
    }
}

impl AppConfig {
    /// Applies environment overrides (`CONFIRMATION_SECRET`, `DATABASE_URL`).
    ///
    /// The lookup is injected so tests don't have to mutate the process environment.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(secret) = lookup("CONFIRMATION_SECRET") {
            self.gate.confirmation_secret = Some(secret);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.store.database_url = url;
        }
        self
    }

    /// Returns the configured confirmation secret.
    ///
    /// # Errors
    /// Returns `Error::Config` if no secret is configured or it is empty.
    pub fn confirmation_secret(&self) -> Result<ConfirmationSecret> {
        match self.gate.confirmation_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(ConfirmationSecret::new(secret)),
            _ => Err(Error::Config {
                message: "No confirmation secret configured (set [gate] confirmation_secret or CONFIRMATION_SECRET)".to_string(),
            }),
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the full application configuration: file (if present) plus environment overrides.
///
/// The file path is taken from `CONFIG_PATH`, falling back to `./config.toml`.
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed, or if no confirmation secret
/// is configured after overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

    let file_config = if Path::new(&path).exists() {
        tracing::debug!("Loading configuration from: {:?}", path);
        load_config(&path)?
    } else {
        tracing::info!("No config file at {:?}, using defaults", path);
        AppConfig::default()
    };

    let config = file_config.with_overrides(|key| std::env::var(key).ok());
    // Fail at startup rather than at the first mutation
    config.confirmation_secret()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [gate]
            confirmation_secret = "3395509"

            [store]
            database_url = "sqlite::memory:"
            poll_interval_secs = 0

            [export]
            date_format = "%Y-%m-%d"
            file_prefix = "stock"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gate.confirmation_secret.as_deref(), Some("3395509"));
        assert_eq!(config.store.database_url, "sqlite::memory:");
        assert_eq!(config.store.poll_interval_secs, 0);
        assert_eq!(config.export.date_format, "%Y-%m-%d");
        assert_eq!(config.export.file_prefix, "stock");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = toml::from_str("[gate]\nconfirmation_secret = \"x\"\n").unwrap();
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.export.date_format, "%d.%m.%Y");
        assert_eq!(config.export.file_prefix, "warehouse_data");
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("CONFIRMATION_SECRET", "from-env"),
            ("DATABASE_URL", "sqlite://other.sqlite"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::default()
            .with_overrides(|key| env.get(key).map(|value| (*value).to_string()));

        assert_eq!(config.gate.confirmation_secret.as_deref(), Some("from-env"));
        assert_eq!(config.store.database_url, "sqlite://other.sqlite");
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let config = AppConfig::default();
        assert!(matches!(
            config.confirmation_secret(),
            Err(Error::Config { .. })
        ));

        let mut empty = AppConfig::default();
        empty.gate.confirmation_secret = Some(String::new());
        assert!(empty.confirmation_secret().is_err());
    }
}
