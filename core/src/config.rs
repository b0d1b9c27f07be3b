//! TOML configuration loading shared by the vault and governance crates

use crate::error::ErrorKind;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Precondition
    }
}

/// Parse a configuration from TOML text
pub fn from_toml_str<T: DeserializeOwned>(contents: &str) -> Result<T, ConfigError> {
    Ok(toml::from_str(contents)?)
}

/// Read and parse a TOML configuration file
pub fn load_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path.as_ref())?;
    log::debug!("Loaded configuration from {}", path.as_ref().display());
    from_toml_str(&contents)
}
