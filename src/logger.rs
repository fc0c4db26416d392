//! The logger facade hosts call into.
//!
//! A [`GraylogLogger`] owns the resolved [`Settings`], the record builder and
//! a publisher that is created on the first record that passes the severity
//! filter. The transport behind the publisher is selected at that point and
//! kept for the lifetime of the logger.
//!
//! Every log call runs under a reentrant lock. Other threads wait for the
//! call in flight; a log call made from inside it on the same thread (a
//! data source or transport that logs through the same logger) is dropped.

use crate::builder::{
    DataSource, LogContext, LogRecordBuilder, Obfuscator, PayloadSource, RedactedJson,
    RequestSource,
};
use crate::config::{ConfigError, GraylogConfig, Settings};
use crate::domain::{LoggerError, Origin, Severity};
use crate::sender::transport::{select_transport, wrap};
use crate::sender::{GelfEncoder, Publisher, Transport};
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::sync::{Arc, OnceLock};
use tracing::debug;

pub const POST_LABEL: &str = "POST";
pub const SESSION_LABEL: &str = "Session";

pub struct GraylogLogger {
    settings: Settings,
    builder: LogRecordBuilder,
    custom_transport: Mutex<Option<Box<dyn Transport>>>,
    publisher: OnceLock<Publisher>,
    init_lock: Mutex<()>,
    in_flight: ReentrantMutex<Cell<bool>>,
}

/// Clears the in-flight flag when the log call returns or unwinds.
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl GraylogLogger {
    /// Logger without data sources. A malformed URL fails here, an unknown
    /// scheme on the first published record.
    pub fn new(config: GraylogConfig) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    pub fn builder(config: GraylogConfig) -> GraylogLoggerBuilder {
        GraylogLoggerBuilder::new(config)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.builder.accepts(severity)
    }

    /// The publisher, created with its transport on first access. Every call
    /// returns the same instance.
    pub fn publisher(&self) -> Result<&Publisher, LoggerError> {
        if let Some(publisher) = self.publisher.get() {
            return Ok(publisher);
        }

        let _init = self.init_lock.lock();
        if let Some(publisher) = self.publisher.get() {
            return Ok(publisher);
        }

        let transport = match self.custom_transport.lock().take() {
            Some(custom) => wrap(custom, self.settings.ignore_transport_errors),
            None => select_transport(&self.settings)?,
        };
        debug!(
            scheme = %self.settings.scheme,
            host = %self.settings.host,
            port = self.settings.port,
            "Initialised GELF publisher"
        );
        let publisher = Publisher::new(transport, GelfEncoder::new());
        Ok(self.publisher.get_or_init(move || publisher))
    }

    /// Logs `message` with the caller's location as origin.
    #[track_caller]
    pub fn log(&self, severity: Severity, message: &str) -> Result<(), LoggerError> {
        self.log_with(severity, message, LogContext::with_origin(Origin::caller()))
    }

    /// Logs with a severity given by name. Unknown names are ignored.
    #[track_caller]
    pub fn write(&self, severity: &str, message: &str) -> Result<(), LoggerError> {
        match severity.parse::<Severity>() {
            Ok(severity) => self.log(severity, message),
            Err(_) => Ok(()),
        }
    }

    pub fn log_with(
        &self,
        severity: Severity,
        message: &str,
        context: LogContext,
    ) -> Result<(), LoggerError> {
        if !self.builder.accepts(severity) {
            return Ok(());
        }

        let state = self.in_flight.lock();
        if state.get() {
            return Ok(());
        }
        state.set(true);
        let _in_flight = InFlight(&state);

        let Some(record) = self.builder.build(severity, message, &context) else {
            return Ok(());
        };
        self.publisher()?.publish(&record)
    }

    #[track_caller]
    pub fn emergency(&self, message: &str) -> Result<(), LoggerError> {
        self.log(Severity::Emergency, message)
    }

    #[track_caller]
    pub fn alert(&self, message: &str) -> Result<(), LoggerError> {
        self.log(Severity::Alert, message)
    }

    #[track_caller]
    pub fn critical(&self, message: &str) -> Result<(), LoggerError> {
        self.log(Severity::Critical, message)
    }

    #[track_caller]
    pub fn error(&self, message: &str) -> Result<(), LoggerError> {
        self.log(Severity::Error, message)
    }

    #[track_caller]
    pub fn warning(&self, message: &str) -> Result<(), LoggerError> {
        self.log(Severity::Warning, message)
    }

    #[track_caller]
    pub fn notice(&self, message: &str) -> Result<(), LoggerError> {
        self.log(Severity::Notice, message)
    }

    #[track_caller]
    pub fn info(&self, message: &str) -> Result<(), LoggerError> {
        self.log(Severity::Info, message)
    }

    #[track_caller]
    pub fn debug(&self, message: &str) -> Result<(), LoggerError> {
        self.log(Severity::Debug, message)
    }
}

/// Registers data sources and an optional custom transport before the
/// logger is built.
pub struct GraylogLoggerBuilder {
    config: GraylogConfig,
    append: Vec<(String, Arc<dyn DataSource>)>,
    additional: Vec<(String, Arc<dyn DataSource>)>,
    request: Option<Arc<dyn RequestSource>>,
    post: Option<Arc<dyn PayloadSource>>,
    session: Option<Arc<dyn PayloadSource>>,
    transport: Option<Box<dyn Transport>>,
}

impl GraylogLoggerBuilder {
    pub fn new(config: GraylogConfig) -> Self {
        Self {
            config,
            append: Vec::new(),
            additional: Vec::new(),
            request: None,
            post: None,
            session: None,
            transport: None,
        }
    }

    /// Appends the source's output to the message body under `label`.
    pub fn append(mut self, label: impl Into<String>, source: impl DataSource + 'static) -> Self {
        self.append.push((label.into(), Arc::new(source)));
        self
    }

    /// Stores the source's output as the structured field `label`.
    pub fn additional(
        mut self,
        label: impl Into<String>,
        source: impl DataSource + 'static,
    ) -> Self {
        self.additional.push((label.into(), Arc::new(source)));
        self
    }

    pub fn request_source(mut self, source: impl RequestSource + 'static) -> Self {
        self.request = Some(Arc::new(source));
        self
    }

    /// Form data appended under `POST` when `append_post` is enabled.
    pub fn post_payload(mut self, source: impl PayloadSource + 'static) -> Self {
        self.post = Some(Arc::new(source));
        self
    }

    /// Session data appended under `Session` when `append_session` is
    /// enabled.
    pub fn session_payload(mut self, source: impl PayloadSource + 'static) -> Self {
        self.session = Some(Arc::new(source));
        self
    }

    /// Replaces the transport selected from the configured scheme.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build(self) -> Result<GraylogLogger, ConfigError> {
        let settings = self.config.resolve()?;
        let mut builder = LogRecordBuilder::new(&settings);

        if let Some(request) = self.request {
            builder.set_request_source(request);
        }
        for (label, source) in self.append {
            builder.add_append_source(label, source);
        }

        let obfuscator = Obfuscator::new(&settings.sensitive_keys);
        if settings.append_post
            && let Some(post) = self.post
        {
            builder.add_append_source(
                POST_LABEL,
                Arc::new(RedactedJson::new(post, obfuscator.clone())),
            );
        }
        if settings.append_session
            && let Some(session) = self.session
        {
            builder.add_append_source(
                SESSION_LABEL,
                Arc::new(RedactedJson::new(session, obfuscator)),
            );
        }

        for (label, source) in self.additional {
            builder.add_additional_source(label, source);
        }

        Ok(GraylogLogger {
            settings,
            builder,
            custom_transport: Mutex::new(self.transport),
            publisher: OnceLock::new(),
            init_lock: Mutex::new(()),
            in_flight: ReentrantMutex::new(Cell::new(false)),
        })
    }
}
