use super::{ConfigError, TlsOptions};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// Deserializes TLS options, treating anything that is not a well-formed
/// options table as absent.
pub fn lenient_tls_options<'de, D>(deserializer: D) -> Result<Option<TlsOptions>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeTls {
        Valid(TlsOptions),
        Other(IgnoredAny),
    }

    Ok(match Option::<MaybeTls>::deserialize(deserializer)? {
        Some(MaybeTls::Valid(options)) => Some(options),
        Some(MaybeTls::Other(_)) | None => None,
    })
}

/// Helper function to load and parse an environment variable.
/// Returns Ok(()) if the variable doesn't exist (keeps default).
pub fn load_env_var<T>(name: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        *target = value
            .parse()
            .map_err(|e| ConfigError::EnvError(format!("Invalid {name}: {e}")))?;
    }
    Ok(())
}

/// Helper function to load and parse an optional environment variable.
pub fn load_env_var_opt<T>(name: &str, target: &mut Option<T>) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        *target = Some(
            value
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid {name}: {e}")))?,
        );
    }
    Ok(())
}

/// Helper function to load an optional string environment variable.
pub fn load_env_string_opt(name: &str, target: &mut Option<String>) {
    if let Ok(value) = std::env::var(name) {
        *target = Some(value);
    }
}

/// Helper function to load a string environment variable.
pub fn load_env_string(name: &str, target: &mut String) {
    if let Ok(value) = std::env::var(name) {
        *target = value;
    }
}

/// Helper function to load a comma separated list environment variable.
pub fn load_env_list(name: &str, target: &mut Vec<String>) {
    if let Ok(value) = std::env::var(name) {
        *target = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
    }
}
