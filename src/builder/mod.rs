//! Log record assembly.
//!
//! [`LogRecordBuilder`] turns a severity, a raw message and the ambient
//! context into a [`LogRecord`]: request fields, origin, appended data
//! sources, an optional call stack and additional fields, followed by the
//! short/full message split.

pub mod backtrace;
pub mod redaction;
pub mod source;

pub use backtrace::CallStack;
pub use redaction::{MASK, Obfuscator};
pub use source::{DataSource, PayloadSource, RedactedJson, RequestInfo, RequestSource};

use crate::config::{FieldLayout, Settings};
use crate::domain::{LogRecord, Origin, Severity, SeveritySet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Marker that starts the call stack section of a full message.
pub const TRACE_MARKER: &str = "Trace:";

/// Per-call context supplied alongside the message.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    pub origin: Option<Origin>,
    /// Extra structured fields, stored after the additional sources
    pub fields: Vec<(String, String)>,
}

impl LogContext {
    pub fn with_origin(origin: Origin) -> Self {
        Self {
            origin: Some(origin),
            fields: Vec::new(),
        }
    }
}

type NamedSource = (String, Arc<dyn DataSource>);

pub struct LogRecordBuilder {
    facility: String,
    levels: SeveritySet,
    field_layout: FieldLayout,
    record_origin: bool,
    append_backtrace: bool,
    trace_start_depth: usize,
    file_root_dir: Option<PathBuf>,
    request: Option<Arc<dyn RequestSource>>,
    append: Vec<NamedSource>,
    additional: Vec<NamedSource>,
}

impl LogRecordBuilder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            facility: settings.facility.clone(),
            levels: settings.levels,
            field_layout: settings.field_layout,
            record_origin: settings.record_origin,
            append_backtrace: settings.append_backtrace,
            trace_start_depth: settings.trace_start_depth,
            file_root_dir: settings.file_root_dir.clone(),
            request: None,
            append: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn set_request_source(&mut self, source: Arc<dyn RequestSource>) {
        self.request = Some(source);
    }

    /// Registers a source whose output is appended to the message body.
    /// Re-using a label replaces the earlier source in its position.
    pub fn add_append_source(&mut self, label: impl Into<String>, source: Arc<dyn DataSource>) {
        upsert(&mut self.append, label.into(), source);
    }

    /// Registers a source whose output becomes a structured field.
    pub fn add_additional_source(
        &mut self,
        label: impl Into<String>,
        source: Arc<dyn DataSource>,
    ) {
        upsert(&mut self.additional, label.into(), source);
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        self.levels.contains(severity)
    }

    /// Builds the record for `message`, or `None` when `severity` is not
    /// enabled.
    pub fn build(&self, severity: Severity, message: &str, context: &LogContext) -> Option<LogRecord> {
        if !self.accepts(severity) {
            return None;
        }

        let mut record = LogRecord::new(severity, self.facility.clone());
        let mut body = message.to_string();

        if let Some(request) = self.request.as_ref().and_then(|r| r.current_request()) {
            if let Some(referer) = request.referer.filter(|r| !r.is_empty()) {
                record.set_field("http_referer", referer);
            }
            record.set_field("request_uri", request.request_target);
        }

        if self.record_origin
            && let Some(origin) = &context.origin
        {
            record.set_field(
                "file",
                backtrace::relativize(&origin.file, self.file_root_dir.as_deref()),
            );
            record.set_field("line", origin.line.to_string());
        }

        for (label, source) in &self.append {
            if let Some(output) = produce(label, source.as_ref()).filter(|o| !o.is_empty()) {
                body.push_str(&format!("\n\n{label}:\n{output}"));
            }
        }

        // Checked against the caller's message so appended payloads can not
        // suppress the trace.
        if self.append_backtrace && !message.contains(TRACE_MARKER) {
            let stack = CallStack::capture(self.trace_start_depth);
            body.push_str(&format!(
                "\n\n{TRACE_MARKER}\n{}",
                stack.render(self.file_root_dir.as_deref())
            ));
        }

        for (label, source) in &self.additional {
            let value = produce(label, source.as_ref()).unwrap_or_default();
            record.set_field(self.field_name(label), value);
        }

        for (name, value) in &context.fields {
            record.set_field(name.clone(), value.clone());
        }

        record.set_message(body);
        Some(record)
    }

    fn field_name(&self, label: &str) -> String {
        match self.field_layout {
            FieldLayout::Flat => label.to_string(),
            FieldLayout::Facility => {
                let prefix: String = self
                    .facility
                    .chars()
                    .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
                    .collect();
                format!("{prefix}_{label}")
            }
        }
    }
}

fn upsert(sources: &mut Vec<NamedSource>, label: String, source: Arc<dyn DataSource>) {
    match sources.iter_mut().find(|(existing, _)| *existing == label) {
        Some((_, slot)) => *slot = source,
        None => sources.push((label, source)),
    }
}

// A failing source is skipped; the record is still published.
fn produce(label: &str, source: &dyn DataSource) -> Option<String> {
    match source.produce() {
        Ok(output) => output,
        Err(e) => {
            warn!(source = label, error = %e, "Data source failed, skipping it");
            None
        }
    }
}
