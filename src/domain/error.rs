//! Domain error types

use thiserror::Error;

/// A time span that is not of the form `1h30m`, `10m`, `90s` or `250ms`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid duration \"{input}\": use whole numbers with h, m, s or ms, largest unit first (e.g. 90s, 10m, 1h30m)")]
pub struct DurationParseError {
    pub input: String,
}

/// Reading, writing or validating the settings file
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Cannot read settings: {0}")]
    Read(String),

    #[error("Settings file is not valid TOML: {0}")]
    Parse(String),

    #[error("Cannot write settings: {0}")]
    Write(String),

    #[error("Invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },

    #[error("Settings file already exists at {0}")]
    AlreadyExists(String),
}
