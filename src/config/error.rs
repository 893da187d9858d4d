use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML syntax in {path}: {source}")]
    InvalidToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("Failed to get home directory")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
