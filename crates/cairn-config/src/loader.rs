//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use cairn_core::CairnError;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Plain environment variables accepted for the backing store, mapped to
/// their `database.*` keys. They are applied before the `CAIRN__` layer.
const DATABASE_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DATABASE_HOST", "database.host"),
    ("DATABASE_PORT", "database.port"),
    ("DATABASE_USER", "database.username"),
    ("DATABASE_PASSWORD", "database.password"),
    ("DATABASE_NAME", "database.name"),
];

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml`
    /// 3. `config/local.toml`
    /// 4. `DATABASE_HOST`, `DATABASE_PORT`, `DATABASE_USER`,
    ///    `DATABASE_PASSWORD` and `DATABASE_NAME`
    /// 5. Environment variables with the `CAIRN` prefix and `__` separator
    pub fn new(config_dir: impl Into<String>) -> Result<Self, CairnError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, CairnError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> Result<(), CairnError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    fn load_config(config_dir: &str) -> Result<AppConfig, CairnError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("CAIRN_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = Self::apply_database_env(builder).map_err(config_error_to_cairn_error)?;

        builder = builder.add_source(
            Environment::with_prefix("CAIRN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error_to_cairn_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    fn apply_database_env(
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        for (var, key) in DATABASE_ENV_OVERRIDES {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            if value.is_some() {
                debug!("Applying {} to {}", var, key);
            }
            builder = builder.set_override_option(*key, value)?;
        }
        Ok(builder)
    }

    /// Validates the configuration.
    pub fn validate_config(config: &AppConfig) -> Result<(), CairnError> {
        ConfigValidator::validate(config)
            .map_err(|errors| CairnError::Configuration(format_validation_errors(&errors)))
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_cairn_error(err: ConfigError) -> CairnError {
    CairnError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheBackend, ListStrategy};
    use std::fs;

    #[tokio::test]
    async fn test_loads_layered_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
            [cache]
            backend = "memory"
            collection_ttl_secs = 60

            [redis]
            enabled = false
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("local.toml"),
            r#"
            [cache]
            list_strategy = "index"
            collection_ttl_secs = 30
            "#,
        )
        .unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string()).unwrap();
        let config = loader.get().await;

        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.list_strategy, ListStrategy::Index);
        assert_eq!(config.cache.collection_ttl_secs, 30);
        assert_eq!(config.cache.entity_ttl_secs, 300);
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
            [cache]
            entity_ttl_secs = 0
            "#,
        )
        .unwrap();

        let err = ConfigLoader::new(dir.path().to_string_lossy().to_string())
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn test_get_value_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string()).unwrap();

        let ttl: Option<u64> = loader.get_value("cache.entity_ttl_secs").await;
        assert_eq!(ttl, Some(300));
        let missing: Option<u64> = loader.get_value("cache.nope").await;
        assert!(missing.is_none());
    }
}
