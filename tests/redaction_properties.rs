use graylog_logger::LogRecord;
use graylog_logger::Severity;
use graylog_logger::builder::{MASK, Obfuscator};
use proptest::prelude::*;
use serde_json::{Value, json};

fn sensitive_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("password".to_string()),
        Just("Password".to_string()),
        Just("NEW_PASSWORD".to_string()),
        Just("old_password".to_string()),
        Just("Current_Password".to_string()),
    ]
}

proptest! {
    #[test]
    fn short_message_never_contains_line_breaks(message in "[a-z\r\n ]{0,40}") {
        let mut record = LogRecord::new(Severity::Info, "billing");
        record.set_message(message.clone());
        prop_assert!(!record.short_message.contains(['\r', '\n']));
        match &record.full_message {
            None => prop_assert_eq!(&record.short_message, &message),
            Some(full) => {
                prop_assert_eq!(full, &message);
                prop_assert_ne!(&record.short_message, &message);
            }
        }
    }

    #[test]
    fn single_line_messages_have_no_full_message(message in "[a-zA-Z0-9 .:]{0,60}") {
        let mut record = LogRecord::new(Severity::Info, "billing");
        record.set_message(message.clone());
        prop_assert_eq!(record.short_message, message);
        prop_assert!(record.full_message.is_none());
    }

    #[test]
    fn sensitive_values_never_leak(
        key in sensitive_key(),
        secret in "[a-z0-9]{1,16}",
        depth in 0usize..4,
    ) {
        let mut fields = serde_json::Map::new();
        fields.insert(key, Value::String(secret.clone()));
        fields.insert("user".to_string(), json!("jane"));
        let mut payload = Value::Object(fields);
        for _ in 0..depth {
            payload = json!({ "nested": [payload] });
        }

        let obfuscator = Obfuscator::new(["password", "new_password", "old_password", "current_password"]);
        let masked = obfuscator.obfuscate(&payload);
        let text = masked.to_string();
        let quoted_secret = format!("\"{secret}\"");
        prop_assert!(!text.contains(&quoted_secret) || secret == "jane");
        prop_assert!(text.contains(MASK));
        prop_assert!(text.contains("\"jane\""));
    }

    #[test]
    fn payload_without_sensitive_keys_is_unchanged(
        values in proptest::collection::btree_map("[a-z]{1,8}", "[ -~]{0,12}", 0..8),
    ) {
        let payload: Value = values
            .into_iter()
            .filter(|(key, _)| !key.contains("password"))
            .map(|(key, value)| (key, Value::String(value)))
            .collect::<serde_json::Map<_, _>>()
            .into();
        let obfuscator = Obfuscator::new(["password"]);
        prop_assert_eq!(obfuscator.obfuscate(&payload), payload);
    }
}

#[test]
fn blank_and_non_string_values_pass_through() {
    let payload = json!({
        "password": "   ",
        "new_password": null,
        "old_password": 1234,
        "current_password": true,
    });
    let obfuscator = Obfuscator::new(["password", "new_password", "old_password", "current_password"]);
    assert_eq!(obfuscator.obfuscate(&payload), payload);
}
