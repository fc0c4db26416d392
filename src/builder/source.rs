use super::redaction::Obfuscator;
use serde_json::Value;
use std::sync::Arc;

/// A named contributor to a log record.
///
/// Append sources add their output to the message body, additional sources
/// become structured fields. `Ok(None)` means there is nothing to add.
pub trait DataSource: Send + Sync {
    fn produce(&self) -> anyhow::Result<Option<String>>;
}

impl<F> DataSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn produce(&self) -> anyhow::Result<Option<String>> {
        Ok(self())
    }
}

/// Supplies structured request data (form fields, session values) to be
/// appended after redaction.
pub trait PayloadSource: Send + Sync {
    fn payload(&self) -> Option<Value>;
}

impl<F> PayloadSource for F
where
    F: Fn() -> Option<Value> + Send + Sync,
{
    fn payload(&self) -> Option<Value> {
        self()
    }
}

/// The HTTP request being served when a record is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestInfo {
    pub referer: Option<String>,
    /// Path and query of the request
    pub request_target: String,
}

/// Gives access to the host's current HTTP request, if any.
pub trait RequestSource: Send + Sync {
    fn current_request(&self) -> Option<RequestInfo>;
}

impl<F> RequestSource for F
where
    F: Fn() -> Option<RequestInfo> + Send + Sync,
{
    fn current_request(&self) -> Option<RequestInfo> {
        self()
    }
}

/// Pretty-printed JSON of a payload with sensitive values masked.
pub struct RedactedJson {
    payload: Arc<dyn PayloadSource>,
    obfuscator: Obfuscator,
}

impl RedactedJson {
    pub fn new(payload: Arc<dyn PayloadSource>, obfuscator: Obfuscator) -> Self {
        Self {
            payload,
            obfuscator,
        }
    }
}

impl DataSource for RedactedJson {
    fn produce(&self) -> anyhow::Result<Option<String>> {
        let Some(payload) = self.payload.payload() else {
            return Ok(None);
        };
        if is_empty_payload(&payload) {
            return Ok(None);
        }
        let masked = self.obfuscator.obfuscate(&payload);
        Ok(Some(serde_json::to_string_pretty(&masked)?))
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
