use crate::domain::LogRecord;
use serde_json::{Map, Value};

pub const GELF_VERSION: &str = "1.1";

/// Additional field names the encoder never emits: `_id` is reserved by
/// Graylog and `_facility` carries the record's facility.
const RESERVED_FIELDS: [&str; 2] = ["id", "facility"];

/// Encodes [`LogRecord`]s as GELF 1.1 JSON.
#[derive(Debug, Clone)]
pub struct GelfEncoder {
    host: String,
}

impl GelfEncoder {
    /// Encoder reporting the local machine's hostname.
    pub fn new() -> Self {
        let host = hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string());
        Self { host }
    }

    pub fn with_host(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn to_value(&self, record: &LogRecord) -> Value {
        let mut message = Map::new();
        message.insert("version".into(), GELF_VERSION.into());
        message.insert("host".into(), self.host.clone().into());
        message.insert("short_message".into(), record.short_message.clone().into());
        if let Some(full) = &record.full_message {
            message.insert("full_message".into(), full.clone().into());
        }
        message.insert(
            "timestamp".into(),
            (record.timestamp.timestamp_millis() as f64 / 1000.0).into(),
        );
        message.insert("level".into(), record.level.syslog_level().into());
        message.insert("_facility".into(), record.facility.clone().into());

        for (name, value) in &record.fields {
            let name = field_name(name);
            if RESERVED_FIELDS.contains(&name.as_str()) {
                continue;
            }
            message.insert(format!("_{name}"), value.clone().into());
        }

        Value::Object(message)
    }

    pub fn encode(&self, record: &LogRecord) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.to_value(record))
    }
}

/// Maps `name` onto the GELF field name alphabet `[\w.-]`.
pub fn field_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl Default for GelfEncoder {
    fn default() -> Self {
        Self::new()
    }
}
