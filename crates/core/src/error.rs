use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaberError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Hierarchy lookups that miss every class source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("class not found in registry: {0}")]
    ClassNotFound(String),
}

pub type Result<T> = std::result::Result<T, SaberError>;
