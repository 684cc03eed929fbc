//! Error types for stage navigation and configuration.

use thiserror::Error;

/// Rejected stage navigation. State is left unchanged when returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("stage index {index} out of range (stage count {count})")]
    OutOfRange { index: usize, count: usize },
    #[error("unknown stage key `{0}`")]
    UnknownKey(String),
}

/// Failure to load, save, or validate a [`crate::SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
