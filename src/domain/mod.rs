//! Domain layer for graylog-logger.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: The GELF record produced for every accepted log call
//! - `Severity`: Syslog severity (Emergency..Debug) and `SeveritySet`
//! - `LoggerError`: Top-level error type

pub mod error;
pub mod record;
pub mod severity;

pub use error::LoggerError;
pub use record::{LogRecord, Origin};
pub use severity::{InvalidSeverity, Severity, SeveritySet};
