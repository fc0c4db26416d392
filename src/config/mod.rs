mod serde_helpers;
mod settings;
mod tls;
mod validation;

use serde::{Deserialize, Serialize};
use serde_helpers::{
    load_env_list, load_env_string, load_env_string_opt, load_env_var, load_env_var_opt,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use settings::Settings;
pub use tls::TlsOptions;

/// Default GELF port.
pub const DEFAULT_PORT: u16 = 12201;
/// Default collector host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default transport scheme.
pub const DEFAULT_SCHEME: &str = "udp";
/// UDP chunk body size that is safe on a LAN.
pub const CHUNK_SIZE_LAN: usize = 8154;
/// UDP chunk body size that is safe across a WAN.
pub const CHUNK_SIZE_WAN: usize = 1420;
/// Keys whose values are masked in appended payloads.
pub const DEFAULT_SENSITIVE_KEYS: [&str; 4] =
    ["password", "new_password", "old_password", "current_password"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown transport scheme '{0}', expected 'udp' or 'tcp'")]
    UnknownScheme(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Environment error: {0}")]
    EnvError(String),
}

/// Naming of structured fields produced by additional data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLayout {
    /// Field is named after the data source label.
    #[default]
    Flat,
    /// Field is named `<facility>_<label>`.
    Facility,
}

/// Adapter configuration as supplied by the host application.
///
/// Every field has a default; `resolve` merges the connection URL and the
/// explicit scheme/host/port overrides into [`Settings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraylogConfig {
    /// Connection URL such as `tcp://graylog:12201`
    pub url: Option<String>,
    /// Explicit scheme, wins over the URL
    pub scheme: Option<String>,
    /// Explicit host, wins over the URL
    pub host: Option<String>,
    /// Explicit port, wins over the URL
    pub port: Option<u16>,
    /// Body bytes per UDP chunk; the 12 byte chunk header is added on top
    pub chunk_size: usize,
    #[serde(deserialize_with = "serde_helpers::lenient_tls_options")]
    pub tls_options: Option<TlsOptions>,
    pub facility: String,
    /// Enabled severities by name; unknown names are dropped
    pub levels: Vec<String>,
    pub append_backtrace: bool,
    pub append_post: bool,
    pub append_session: bool,
    /// Attach `file` and `line` of the log call
    pub record_origin: bool,
    pub sensitive_keys: Vec<String>,
    pub ignore_transport_errors: bool,
    /// Frames skipped past the first frame outside the logger
    pub trace_start_depth: usize,
    /// Paths in origins and backtraces are made relative to this directory
    pub file_root_dir: Option<PathBuf>,
    pub field_layout: FieldLayout,
    /// Gzip UDP payloads
    pub compress: bool,
    pub connection_timeout_secs: u64,
}

impl Default for GraylogConfig {
    fn default() -> Self {
        Self {
            url: None,
            scheme: None,
            host: None,
            port: None,
            chunk_size: CHUNK_SIZE_LAN,
            tls_options: None,
            facility: default_facility(),
            levels: Vec::new(),
            append_backtrace: false,
            append_post: false,
            append_session: false,
            record_origin: true,
            sensitive_keys: DEFAULT_SENSITIVE_KEYS.iter().map(|k| k.to_string()).collect(),
            ignore_transport_errors: true,
            trace_start_depth: 0,
            file_root_dir: None,
            field_layout: FieldLayout::Flat,
            compress: false,
            connection_timeout_secs: 30,
        }
    }
}

/// Name of the running executable, used as facility unless configured.
pub fn default_facility() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

impl GraylogConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GraylogConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = GraylogConfig::default();

        load_env_string_opt("GRAYLOG_URL", &mut config.url);
        load_env_string_opt("GRAYLOG_SCHEME", &mut config.scheme);
        load_env_string_opt("GRAYLOG_HOST", &mut config.host);
        load_env_var_opt("GRAYLOG_PORT", &mut config.port)?;
        load_env_var("GRAYLOG_CHUNK_SIZE", &mut config.chunk_size)?;
        load_env_string("GRAYLOG_FACILITY", &mut config.facility);
        load_env_list("GRAYLOG_LEVELS", &mut config.levels);
        load_env_var("GRAYLOG_APPEND_BACKTRACE", &mut config.append_backtrace)?;
        load_env_var(
            "GRAYLOG_IGNORE_TRANSPORT_ERRORS",
            &mut config.ignore_transport_errors,
        )?;
        load_env_var("GRAYLOG_COMPRESS", &mut config.compress)?;

        config.validate()?;
        Ok(config)
    }

    /// Merges defaults, the connection URL and explicit overrides.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        self.validate()?;
        Settings::resolve(self)
    }
}
