use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

// Import logging macros
use crate::{log_system_event, log_validation};

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub resolver: ResolverConfig,
    pub aggregator: AggregatorConfig,
    pub logging: LoggingConfig,
}

/// Which quiz service implementation to talk to
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum ApiMode {
    Remote,
    Offline,
}

/// Remote quiz service connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub mode: ApiMode,
}

/// Catalog retry policy used during topic resolution
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_ms: u64,
}

/// Merge and shuffle policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregatorConfig {
    pub per_topic_limit: Option<usize>,
    pub shuffle_seed: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

/// Logging system configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        log_system_event!(config, "Loading application configuration from environment variables");

        let service_config = ServiceConfig::from_env()?;
        let resolver_config = ResolverConfig::from_env(service_config.request_timeout_ms)?;
        let aggregator_config = AggregatorConfig::from_env(service_config.request_timeout_ms)?;
        let logging_config = LoggingConfig::from_env()?;

        let config = Config {
            service: service_config,
            resolver: resolver_config,
            aggregator: aggregator_config,
            logging: logging_config,
        };

        log_system_event!(config, "Configuration loaded successfully");
        config.log_configuration_summary();

        Ok(config)
    }

    /// Log a summary of loaded configuration
    fn log_configuration_summary(&self) {
        info!(
            base_url = %self.service.base_url,
            mode = ?self.service.mode,
            request_timeout_ms = self.service.request_timeout_ms,
            catalog_retry_attempts = self.resolver.max_attempts,
            catalog_retry_delay_ms = self.resolver.retry_delay_ms,
            per_topic_limit = ?self.aggregator.per_topic_limit,
            shuffle_seeded = self.aggregator.shuffle_seed.is_some(),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.service.mode == ApiMode::Remote
            && !self.service.base_url.starts_with("http://")
            && !self.service.base_url.starts_with("https://")
        {
            return Err(anyhow!("QUIZ_API_BASE_URL must start with 'http://' or 'https://'"));
        }

        if self.service.request_timeout_ms == 0 {
            return Err(anyhow!("Request timeout must be greater than 0"));
        }

        if self.resolver.max_attempts == 0 {
            return Err(anyhow!("Catalog retry attempts must be at least 1"));
        }

        if self.aggregator.per_topic_limit == Some(0) {
            return Err(anyhow!("QUIZ_PER_TOPIC_LIMIT must be greater than 0 when set"));
        }

        if self.service.mode == ApiMode::Offline {
            warn!("Offline mode enabled - quizzes will contain sample questions only");
        }

        // Validate log level
        if !["trace", "debug", "info", "warn", "error"]
            .iter()
            .any(|l| self.logging.level.to_lowercase().starts_with(l))
        {
            warn!("Invalid log level '{}', using 'info' as fallback", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl ServiceConfig {
    fn from_env() -> Result<Self> {
        let base_url = env::var("QUIZ_API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let request_timeout_ms = parse_env("QUIZ_REQUEST_TIMEOUT_MS", 30_000u64)?;

        let offline = env::var("QUIZ_OFFLINE_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        Ok(ServiceConfig {
            base_url,
            request_timeout_ms,
            mode: if offline { ApiMode::Offline } else { ApiMode::Remote },
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl ResolverConfig {
    fn from_env(request_timeout_ms: u64) -> Result<Self> {
        let max_attempts = parse_env("QUIZ_CATALOG_RETRY_ATTEMPTS", 3u32)?;
        let retry_delay_ms = parse_env("QUIZ_CATALOG_RETRY_DELAY_MS", 500u64)?;

        Ok(ResolverConfig {
            max_attempts,
            retry_delay_ms,
            request_timeout_ms,
        })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 500,
            request_timeout_ms: 30_000,
        }
    }
}

impl AggregatorConfig {
    fn from_env(request_timeout_ms: u64) -> Result<Self> {
        let per_topic_limit = parse_optional_env::<usize>("QUIZ_PER_TOPIC_LIMIT")?;
        let shuffle_seed = parse_optional_env::<u64>("QUIZ_SHUFFLE_SEED")?;

        Ok(AggregatorConfig {
            per_topic_limit,
            shuffle_seed,
            request_timeout_ms: Some(request_timeout_ms),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(30_000))
    }
}

impl LoggingConfig {
    /// Read only the logging settings, so the subscriber can be installed
    /// before the rest of the configuration is loaded
    pub fn from_env() -> Result<Self> {
        let level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,topic_quiz=debug".to_string());

        let file_enabled = env::var("LOG_FILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let console_enabled = env::var("LOG_CONSOLE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let log_directory = env::var("LOG_DIRECTORY")
            .unwrap_or_else(|_| "logs".to_string());

        Ok(LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("Invalid {} value: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_optional_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: '{}'", key, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn valid_config() -> Config {
        Config {
            service: ServiceConfig {
                base_url: "http://127.0.0.1:8000".to_string(),
                request_timeout_ms: 30_000,
                mode: ApiMode::Remote,
            },
            resolver: ResolverConfig::default(),
            aggregator: AggregatorConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file_enabled: true,
                console_enabled: true,
                log_directory: "logs".to_string(),
            },
        }
    }

    #[test]
    fn test_resolver_config_defaults() {
        // Clear environment variables to test defaults
        unsafe {
            env::remove_var("QUIZ_CATALOG_RETRY_ATTEMPTS");
            env::remove_var("QUIZ_CATALOG_RETRY_DELAY_MS");
        }

        let config = ResolverConfig::from_env(1_000).unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_aggregator_config_parsing() {
        unsafe {
            env::set_var("QUIZ_PER_TOPIC_LIMIT", "4");
            env::set_var("QUIZ_SHUFFLE_SEED", "");
        }

        let config = AggregatorConfig::from_env(2_000).unwrap();
        assert_eq!(config.per_topic_limit, Some(4));
        assert_eq!(config.shuffle_seed, None);

        unsafe { env::set_var("QUIZ_PER_TOPIC_LIMIT", "many"); }
        assert!(AggregatorConfig::from_env(2_000).is_err());

        unsafe {
            env::remove_var("QUIZ_PER_TOPIC_LIMIT");
            env::remove_var("QUIZ_SHUFFLE_SEED");
        }
    }

    #[test]
    fn test_logging_config_from_env() {
        unsafe {
            env::set_var("LOG_FILE_ENABLED", "false");
            env::set_var("LOG_CONSOLE_ENABLED", "not-a-bool");
            env::set_var("LOG_DIRECTORY", "/tmp/topic-quiz-logs");
        }

        let config = LoggingConfig::from_env().unwrap();
        assert!(!config.file_enabled);
        assert!(config.console_enabled);
        assert_eq!(config.log_directory, "/tmp/topic-quiz-logs");

        unsafe {
            env::remove_var("LOG_FILE_ENABLED");
            env::remove_var("LOG_CONSOLE_ENABLED");
            env::remove_var("LOG_DIRECTORY");
        }

        let config = LoggingConfig::from_env().unwrap();
        assert!(config.file_enabled);
        assert_eq!(config.log_directory, "logs");
    }

    #[test]
    fn test_config_validation() {
        let config = valid_config();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.service.request_timeout_ms = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.resolver.max_attempts = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.service.base_url = "ftp://example.com".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.aggregator.per_topic_limit = Some(0);
        assert!(invalid.validate().is_err());

        // Offline mode never touches the base URL
        let mut offline = config;
        offline.service.mode = ApiMode::Offline;
        offline.service.base_url = String::new();
        assert!(offline.validate().is_ok());
    }
}
