use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug, Clone)]
pub enum LoggingInitError {
    #[error("Invalid log filter '{filter}': {details}")]
    InvalidFilter { filter: String, details: String },
    #[error("Logging initialization failed: {0}")]
    InitFailed(String),
}

static INIT: OnceLock<Result<(), LoggingInitError>> = OnceLock::new();

/// Installs the diagnostics subscriber once. `RUST_LOG` wins over
/// `default_filter`; later calls return the first outcome.
pub fn setup_logging_safe(default_filter: &str, json: bool) -> Result<(), LoggingInitError> {
    INIT.get_or_init(|| {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(default_filter).map_err(|e| {
                LoggingInitError::InvalidFilter {
                    filter: default_filter.to_string(),
                    details: e.to_string(),
                }
            })?,
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
            .with((!json).then(|| {
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_writer(std::io::stderr)
            }))
            .try_init()
            .map_err(|e| LoggingInitError::InitFailed(e.to_string()))
    })
    .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_is_idempotent() {
        let first = setup_logging_safe("warn", false);
        let second = setup_logging_safe("debug", true);
        assert_eq!(first.is_ok(), second.is_ok());
    }
}
