//! Configuration loading and validation.

use std::path::Path;

use thiserror::Error;

use super::schema::ConsoleConfig;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Load and validate a TOML configuration file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConsoleConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let config: ConsoleConfig = toml::from_str(&raw)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConsoleConfig) -> Result<(), ConfigError> {
    if config.buffers.output_lines == 0 {
        return Err(ConfigError::Invalid("buffers.output_lines must be > 0".into()));
    }
    if config.buffers.history_entries == 0 {
        return Err(ConfigError::Invalid(
            "buffers.history_entries must be > 0".into(),
        ));
    }
    if config.dispatcher.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "dispatcher.poll_interval_ms must be > 0".into(),
        ));
    }
    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        return Err(ConfigError::Invalid(format!(
            "listener.bind_address is not a socket address: {}",
            config.listener.bind_address
        )));
    }
    Ok(())
}
