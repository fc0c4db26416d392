use crate::config::{ConfigError, GraylogConfig};
use crate::domain::Severity;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

/// Sends one message to a Graylog collector.
#[derive(Parser, Debug, Clone)]
#[command(name = "graylog-send", author, version, about, long_about = None)]
pub struct Cli {
    /// Collector URL, e.g. udp://graylog:12201
    #[arg(long)]
    pub url: Option<String>,

    /// Transport scheme (udp or tcp), overrides the URL
    #[arg(long)]
    pub scheme: Option<String>,

    /// Collector host, overrides the URL
    #[arg(long)]
    pub host: Option<String>,

    /// Collector port, overrides the URL
    #[arg(long)]
    pub port: Option<u16>,

    /// Facility reported with the message
    #[arg(long)]
    pub facility: Option<String>,

    /// Severity of the message
    #[arg(long, default_value = "info")]
    pub level: Severity,

    /// TOML configuration file; GRAYLOG_* variables are used without one
    #[arg(long, env = "GRAYLOG_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Filter for the tool's own diagnostics
    #[arg(long, env = "GRAYLOG_SEND_LOG", default_value = "warn")]
    pub log_level: String,

    /// Print diagnostics as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Message text, `-` reads it from stdin
    pub message: String,
}

impl Cli {
    /// Loads the base configuration and applies the command line overrides.
    /// Delivery failures are always reported.
    pub fn to_config(&self) -> Result<GraylogConfig, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => GraylogConfig::from_file(path)?,
            None => GraylogConfig::from_env()?,
        };

        if self.url.is_some() {
            config.url = self.url.clone();
        }
        if self.scheme.is_some() {
            config.scheme = self.scheme.clone();
        }
        if self.host.is_some() {
            config.host = self.host.clone();
        }
        if self.port.is_some() {
            config.port = self.port;
        }
        if let Some(facility) = &self.facility {
            config.facility = facility.clone();
        }
        config.ignore_transport_errors = false;

        config.validate()?;
        Ok(config)
    }

    pub fn read_message<R: Read>(&self, mut stdin: R) -> std::io::Result<String> {
        if self.message != "-" {
            return Ok(self.message.clone());
        }
        let mut message = String::new();
        stdin.read_to_string(&mut message)?;
        Ok(message.trim_end_matches(['\r', '\n']).to_string())
    }
}
