use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SUPPORTED_VERSION: &str = "1.0";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != SUPPORTED_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.logging.filter.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "logging.filter must not be empty".to_string(),
        });
    }

    if let Some(ref path) = config.database_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "databasePath must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
