use thiserror::Error;

use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "logging.format must be one of {}, got `{}`",
                LOG_FORMATS.join(", "),
                self.logging.format
            )));
        }

        if self.quotes.enabled {
            url::Url::parse(&self.quotes.api_url).map_err(|e| {
                ConfigError::InvalidConfig(format!(
                    "quotes.api_url `{}` is not a valid url: {e}",
                    self.quotes.api_url
                ))
            })?;

            if self.quotes.timeout_secs == 0 {
                return Err(ConfigError::InvalidConfig(
                    "quotes.timeout_secs must be greater than zero".to_string(),
                ));
            }
        }

        // r2d2 asserts on both of these instead of returning an error.
        let max = self.database.max_connections();
        let min = self.database.min_connections();
        if max == 0 {
            return Err(ConfigError::InvalidConfig(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if min > max {
            return Err(ConfigError::InvalidConfig(format!(
                "database.min_connections ({min}) exceeds database.max_connections ({max})"
            )));
        }

        Ok(())
    }
}
