#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_possible_truncation, // Chunk counts are bounded by MAX_CHUNKS
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. ConfigError in config module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

//! GELF adapter for application logging.
//!
//! [`GraylogLogger`] turns a severity and a message into a GELF record and
//! publishes it to a Graylog collector over UDP or TCP. The transport is
//! selected from the configuration on first use and cached for the lifetime
//! of the logger. [`GraylogLayer`] plugs the same logger into `tracing`.

pub mod app;
pub mod builder;
pub mod config;
pub mod domain;
pub mod layer;
pub mod logger;
pub mod sender;

// Re-export main types for easy access
pub use builder::{DataSource, LogContext, LogRecordBuilder, PayloadSource, RequestInfo, RequestSource};
pub use config::{ConfigError, FieldLayout, GraylogConfig, Settings, TlsOptions};
pub use domain::{LogRecord, LoggerError, Origin, Severity, SeveritySet};
pub use layer::GraylogLayer;
pub use logger::{GraylogLogger, GraylogLoggerBuilder};
pub use sender::{Publisher, Transport, TransportError, TransportSpec};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
