//! `tracing` integration.
//!
//! ```no_run
//! use graylog_logger::{GraylogConfig, GraylogLayer, GraylogLogger};
//! use std::sync::Arc;
//! use tracing_subscriber::prelude::*;
//!
//! let logger = Arc::new(GraylogLogger::new(GraylogConfig::default()).unwrap());
//! tracing_subscriber::registry()
//!     .with(GraylogLayer::new(logger))
//!     .init();
//! ```

use crate::builder::LogContext;
use crate::domain::{Origin, Severity};
use crate::logger::GraylogLogger;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Forwards `tracing` events to a [`GraylogLogger`].
///
/// The `message` field becomes the message body, every other field a
/// structured GELF field. Events emitted while a record is being published
/// on the same thread are dropped.
#[derive(Clone)]
pub struct GraylogLayer {
    logger: Arc<GraylogLogger>,
}

impl GraylogLayer {
    pub fn new(logger: Arc<GraylogLogger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Arc<GraylogLogger> {
        &self.logger
    }
}

impl<S: Subscriber> Layer<S> for GraylogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = Severity::from(metadata.level());
        if !self.logger.is_enabled(severity) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let origin = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => Some(Origin::new(file, line)),
            _ => None,
        };
        let context = LogContext {
            origin,
            fields: visitor.fields,
        };

        // Reporting through tracing would feed back into this layer
        if let Err(e) = self.logger.log_with(severity, &visitor.message, context) {
            eprintln!("graylog: failed to publish {} event: {e}", metadata.target());
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl EventVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }
}
