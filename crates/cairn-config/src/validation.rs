//! Configuration validation.
//!
//! Every section is checked and all problems are reported together, so a
//! misconfigured deployment fails at start-up with the full list.

use crate::{AppConfig, CacheConfig, DatabaseConfig, ObservabilityConfig, RedisConfig, ServerConfig};
use std::fmt;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Timeout or TTL must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Cache TTL exceeds maximum allowed.
    TtlTooLarge { name: String, value: u64, maximum: u64 },
    /// The Redis backend was selected while Redis is disabled.
    RedisBackendDisabled,
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
    /// Metrics path must be absolute.
    InvalidMetricsPath { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {}: {} (must be 1-65535)", name, value)
            }
            Self::InvalidPoolSize { min, max } => {
                write!(
                    f,
                    "Invalid pool size: min ({}) cannot be greater than max ({})",
                    min, max
                )
            }
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {} exceeds maximum allowed ({})", value, maximum)
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "'{}' must be positive, got {}", name, value)
            }
            Self::TtlTooLarge {
                name,
                value,
                maximum,
            } => {
                write!(f, "'{}' of {}s exceeds maximum allowed ({}s)", name, value, maximum)
            }
            Self::RedisBackendDisabled => {
                write!(
                    f,
                    "cache.backend is 'redis' but redis.enabled is false (use backend = \"memory\")"
                )
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: pretty, json)", value)
            }
            Self::InvalidMetricsPath { value } => {
                write!(f, "Metrics path must start with '/': '{}'", value)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    #[must_use]
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Maximum cache TTL (one year).
    const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    /// Valid log formats.
    const VALID_LOG_FORMATS: &'static [&'static str] = &["pretty", "json"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();

        Self::validate_server(&config.server, &mut result);
        Self::validate_database(&config.database, &mut result);
        Self::validate_redis(&config.redis, &mut result);
        Self::validate_cache(&config.cache, &config.redis, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_server(config: &ServerConfig, result: &mut ValidationResult) {
        if config.port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }
        if config.request_timeout_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "server.request_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_database(config: &DatabaseConfig, result: &mut ValidationResult) {
        if config.url.is_empty() {
            if config.host.trim().is_empty() || config.name.trim().is_empty() {
                result.add_error(ConfigValidationError::InvalidUrl {
                    url_type: "database".to_string(),
                    message: "either url or host and name must be set".to_string(),
                });
            }
            if config.port == 0 {
                result.add_error(ConfigValidationError::InvalidPort {
                    name: "database.port".to_string(),
                    value: 0,
                });
            }
        } else if !config.url.starts_with("postgres://") && !config.url.starts_with("postgresql://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with postgres:// or postgresql://".to_string(),
            });
        }

        if config.min_connections > config.max_connections {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: config.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }
        if config.connect_timeout_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "database.connect_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_redis(config: &RedisConfig, result: &mut ValidationResult) {
        if !config.enabled {
            return;
        }

        if !config.url.starts_with("redis://") && !config.url.starts_with("rediss://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }
        if config.pool_size > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: config.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }
    }

    fn validate_cache(config: &CacheConfig, redis: &RedisConfig, result: &mut ValidationResult) {
        if config.backend.needs_redis() && !redis.enabled {
            result.add_error(ConfigValidationError::RedisBackendDisabled);
        }
        for (name, value) in [
            ("cache.collection_ttl_secs", config.collection_ttl_secs),
            ("cache.entity_ttl_secs", config.entity_ttl_secs),
        ] {
            if value == 0 {
                result.add_error(ConfigValidationError::NonPositiveTimeout {
                    name: name.to_string(),
                    value,
                });
            } else if value > Self::MAX_CACHE_TTL_SECS {
                result.add_error(ConfigValidationError::TtlTooLarge {
                    name: name.to_string(),
                    value,
                    maximum: Self::MAX_CACHE_TTL_SECS,
                });
            }
        }
    }

    fn validate_observability(config: &ObservabilityConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        let format = config.log_format.to_lowercase();
        if !Self::VALID_LOG_FORMATS.contains(&format.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }

        if config.metrics_enabled && !config.metrics_path.starts_with('/') {
            result.add_error(ConfigValidationError::InvalidMetricsPath {
                value: config.metrics_path.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
#[must_use]
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}
