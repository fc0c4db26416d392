use super::severity::Severity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::panic::Location;

/// Source location a log call originated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub file: String,
    pub line: u32,
}

impl Origin {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the nearest caller not marked `#[track_caller]`.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }
}

/// A GELF record ready for publishing.
///
/// `full_message` is only present when it differs from `short_message`, so
/// the payload never carries the same text twice.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub short_message: String,
    pub full_message: Option<String>,
    pub level: Severity,
    pub facility: String,
    pub timestamp: DateTime<Utc>,
    // Insertion ordered; setting an existing name replaces its value in place.
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    pub fn new(level: Severity, facility: impl Into<String>) -> Self {
        Self {
            short_message: String::new(),
            full_message: None,
            level,
            facility: facility.into(),
            timestamp: Utc::now(),
            fields: Vec::new(),
        }
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets the short message to the first line of `message` and keeps the
    /// whole text as full message only when it spans more than that line.
    pub fn set_message(&mut self, message: String) {
        let short = first_line(&message);
        if short == message {
            self.short_message = message;
            self.full_message = None;
        } else {
            self.short_message = short.to_string();
            self.full_message = Some(message);
        }
    }
}

/// First line of `message`, skipping leading line breaks.
pub fn first_line(message: &str) -> &str {
    message
        .trim_start_matches(['\r', '\n'])
        .split(['\r', '\n'])
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_has_no_full_message() {
        let mut record = LogRecord::new(Severity::Error, "app");
        record.set_message("hello".to_string());
        assert_eq!(record.short_message, "hello");
        assert!(record.full_message.is_none());
    }

    #[test]
    fn test_multi_line_keeps_full_message() {
        let mut record = LogRecord::new(Severity::Info, "app");
        record.set_message("first\r\nsecond".to_string());
        assert_eq!(record.short_message, "first");
        assert_eq!(record.full_message.as_deref(), Some("first\r\nsecond"));
    }

    #[test]
    fn test_leading_breaks_are_skipped() {
        assert_eq!(first_line("\n\nbody\nmore"), "body");
        assert_eq!(first_line(""), "");
        assert_eq!(first_line("\r\n"), "");
    }

    #[test]
    fn test_set_field_replaces_in_place() {
        let mut record = LogRecord::new(Severity::Info, "app");
        record.set_field("a", "1");
        record.set_field("b", "2");
        record.set_field("a", "3");
        assert_eq!(
            record.fields,
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
        assert_eq!(record.field("a"), Some("3"));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn test_origin_caller() {
        let origin = Origin::caller();
        assert!(origin.file.ends_with("record.rs"));
        assert!(origin.line > 0);
    }
}
