//! The `graylog-send` command line tool.

pub mod cli;
pub mod logging_system;

pub use cli::Cli;
pub use logging_system::{LoggingInitError, setup_logging_safe};

use crate::builder::LogContext;
use crate::logger::GraylogLogger;
use anyhow::Context as _;
use tracing::{debug, warn};

/// Sends the message described by `cli`.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    setup_logging_safe(&cli.log_level, cli.log_json)?;

    let config = cli.to_config().context("loading configuration")?;
    let message = cli
        .read_message(std::io::stdin().lock())
        .context("reading message from stdin")?;

    let logger = GraylogLogger::new(config)?;
    if !logger.is_enabled(cli.level) {
        warn!(level = %cli.level, "Severity is not enabled, nothing sent");
        return Ok(());
    }

    let settings = logger.settings();
    debug!(
        scheme = %settings.scheme,
        host = %settings.host,
        port = settings.port,
        facility = %settings.facility,
        "Sending message"
    );

    // The tool's own call site is meaningless as origin
    logger
        .log_with(cli.level, &message, LogContext::default())
        .with_context(|| format!("sending to {}:{}", settings.host, settings.port))
}
