use crate::config::ConfigError;
use crate::sender::TransportError;
use thiserror::Error;

/// Top-level error returned from a log call.
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
