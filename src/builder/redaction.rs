use serde_json::Value;

/// Placeholder written in place of a sensitive value.
pub const MASK: &str = "********";

/// Masks values of sensitive keys in JSON payloads.
#[derive(Debug, Clone, Default)]
pub struct Obfuscator {
    keys: Vec<String>,
}

impl Obfuscator {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    /// Returns a copy of `data` with every non-blank string stored under a
    /// sensitive key replaced by [`MASK`]. Keys match case-insensitively at
    /// any depth.
    pub fn obfuscate(&self, data: &Value) -> Value {
        let mut copy = data.clone();
        self.mask_in_place(&mut copy);
        copy
    }

    fn mask_in_place(&self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, entry) in map {
                    if let Value::String(text) = entry {
                        if !text.trim().is_empty() && self.is_sensitive(key) {
                            *text = MASK.to_string();
                        }
                    } else {
                        self.mask_in_place(entry);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.mask_in_place(item);
                }
            }
            _ => {}
        }
    }

    fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.keys.iter().any(|k| *k == key)
    }
}
