//! Application configuration

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::RecorderError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub poll: PollConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Credential sets to poll with; each gets its own pass.
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct PollConfig {
    /// Delay between poll passes.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub interval: Duration,
    /// Number of passes before exiting; unbounded when unset.
    pub iterations: Option<u64>,
}

fn default_max_connections() -> u32 {
    5
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("TELEMETRY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.api.base_url.is_empty() {
            return Err(RecorderError::ConfigurationError {
                message: "API base URL cannot be empty".to_string(),
            });
        }
        if self.database.url.is_empty() {
            return Err(RecorderError::ConfigurationError {
                message: "Database URL cannot be empty".to_string(),
            });
        }
        if self.poll.interval.is_zero() {
            return Err(RecorderError::ConfigurationError {
                message: "Poll interval must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_config() {
        env::set_var("TELEMETRY__API__BASE_URL", "https://backend.example.com/api");
        env::set_var("TELEMETRY__DATABASE__URL", "postgres://localhost/telemetry");
        env::set_var("TELEMETRY__DATABASE__MAX_CONNECTIONS", "3");
        env::set_var("TELEMETRY__POLL__INTERVAL", "60");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.api.base_url, "https://backend.example.com/api");
        assert!(config.api.credentials.is_empty());
        assert_eq!(config.database.url, "postgres://localhost/telemetry");
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.poll.interval, Duration::from_secs(60));
        assert_eq!(config.poll.iterations, None);
    }

    fn valid_config() -> AppConfig {
        AppConfig {
            api: ApiConfig {
                base_url: "https://backend.example.com/api".to_string(),
                credentials: vec![Credential {
                    username: "user".to_string(),
                    password: "secret".to_string(),
                }],
            },
            database: DatabaseConfig {
                url: "postgres://localhost/telemetry".to_string(),
                max_connections: 5,
            },
            poll: PollConfig {
                interval: Duration::from_secs(60),
                iterations: Some(1),
            },
        }
    }

    #[test]
    fn test_config_validate() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validate_empty_base_url() {
        let mut config = valid_config();
        config.api.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_zero_interval() {
        let mut config = valid_config();
        config.poll.interval = Duration::from_secs(0);
        assert!(config.validate().is_err());
    }
}
