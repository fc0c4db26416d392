use super::{ConfigError, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SCHEME, FieldLayout, GraylogConfig, TlsOptions};
use crate::domain::SeveritySet;
use std::path::PathBuf;
use std::time::Duration;
use url::{Host, Url};

/// Resolved, immutable adapter settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Lower-cased; validated only when the transport is selected
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub chunk_size: usize,
    pub tls_options: Option<TlsOptions>,
    pub facility: String,
    pub levels: SeveritySet,
    pub append_backtrace: bool,
    pub append_post: bool,
    pub append_session: bool,
    pub record_origin: bool,
    /// Lower-cased
    pub sensitive_keys: Vec<String>,
    pub ignore_transport_errors: bool,
    pub trace_start_depth: usize,
    pub file_root_dir: Option<PathBuf>,
    pub field_layout: FieldLayout,
    pub compress: bool,
    pub connection_timeout: Duration,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct UrlParts {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
}

impl Settings {
    pub(super) fn resolve(config: &GraylogConfig) -> Result<Self, ConfigError> {
        let from_url = match &config.url {
            Some(raw) => parse_connection_url(raw)?,
            None => UrlParts::default(),
        };

        let scheme = config
            .scheme
            .clone()
            .or(from_url.scheme)
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string())
            .to_lowercase();
        let host = config
            .host
            .clone()
            .or(from_url.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = config.port.or(from_url.port).unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::InvalidConfig(
                "Port must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            scheme,
            host,
            port,
            chunk_size: config.chunk_size,
            tls_options: config.tls_options.clone(),
            facility: config.facility.clone(),
            levels: SeveritySet::from_names(&config.levels),
            append_backtrace: config.append_backtrace,
            append_post: config.append_post,
            append_session: config.append_session,
            record_origin: config.record_origin,
            sensitive_keys: config
                .sensitive_keys
                .iter()
                .map(|key| key.to_lowercase())
                .collect(),
            ignore_transport_errors: config.ignore_transport_errors,
            trace_start_depth: config.trace_start_depth,
            file_root_dir: config.file_root_dir.clone(),
            field_layout: config.field_layout,
            compress: config.compress,
            connection_timeout: Duration::from_secs(config.connection_timeout_secs),
        })
    }
}

/// Splits `scheme://host:port` into its parts. A URL without scheme is read
/// as `host:port` and leaves the scheme unset.
fn parse_connection_url(raw: &str) -> Result<UrlParts, ConfigError> {
    let has_scheme = raw.contains("://");
    let candidate = if has_scheme {
        raw.to_string()
    } else {
        format!("gelf://{raw}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid connection URL '{raw}': {e}")))?;

    let host = match url.host() {
        Some(Host::Ipv6(addr)) => Some(addr.to_string()),
        Some(host) => Some(host.to_string()),
        None => None,
    };

    Ok(UrlParts {
        scheme: has_scheme.then(|| url.scheme().to_string()),
        host: host.filter(|h| !h.is_empty()),
        port: url.port(),
    })
}
