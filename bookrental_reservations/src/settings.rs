use std::path::Path;

use anyhow::Context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    InMemory,
    Postgres,
}

/// Runtime settings, read from an optional toml file and BOOKRENTAL_* environment variables.
/// Environment variables win over the file.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct Settings {
    pub storage: StorageKind,
    pub db_host: String,
    pub db_username: String,
    pub db_password: String,
    /// Default tracing filter, RUST_LOG takes precedence when set
    pub log_filter: String,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("storage", "in_memory")?
        .set_default("db_host", "127.0.0.1")?
        .set_default("db_username", "postgres")?
        .set_default("db_password", "postgres")?
        .set_default("log_filter", "info")
}

impl Settings {
    /// Loads settings from config_file, or from bookrental.toml in the working directory if it exists
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("bookrental").required(false),
        };

        Self::from_builder(
            defaults()?
                .add_source(file)
                .add_source(Environment::with_prefix("BOOKRENTAL")),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")
    }
}

#[cfg(test)]
mod settings_tests {
    use config::FileFormat;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(
            settings,
            Settings {
                storage: StorageKind::InMemory,
                db_host: "127.0.0.1".to_string(),
                db_username: "postgres".to_string(),
                db_password: "postgres".to_string(),
                log_filter: "info".to_string(),
            }
        );
    }

    #[test]
    #[serial]
    fn test_file_values_override_defaults() {
        let settings = Settings::from_builder(defaults().unwrap().add_source(File::from_str(
            "storage = \"postgres\"\ndb_host = \"db.internal\"",
            FileFormat::Toml,
        )))
        .unwrap();

        assert_eq!(settings.storage, StorageKind::Postgres);
        assert_eq!(settings.db_host, "db.internal");
        assert_eq!(settings.db_username, "postgres");
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        std::env::set_var("BOOKRENTAL_STORAGE", "postgres");
        std::env::set_var("BOOKRENTAL_DB_PASSWORD", "secret");
        let settings = Settings::load(None);
        std::env::remove_var("BOOKRENTAL_STORAGE");
        std::env::remove_var("BOOKRENTAL_DB_PASSWORD");

        let settings = settings.unwrap();
        assert_eq!(settings.storage, StorageKind::Postgres);
        assert_eq!(settings.db_password, "secret");
    }

    #[test]
    #[serial]
    fn test_missing_config_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("does/not/exist.toml"))).is_err());
    }
}
