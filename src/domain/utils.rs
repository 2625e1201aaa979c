//! Shared argument extraction and formatting helpers for handlers

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::errors::ToolError;

/// A required string argument. Absent, `null`, or non-string values count as missing.
pub fn required_str<'a>(args: &'a Value, key: &'static str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or(ToolError::MissingArgument(key))
}

pub fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Shows only the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{visible}", "*".repeat(chars.len() - 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_str_rejects_missing_and_non_string() {
        let args = json!({"text": "hi", "count": 3, "empty": null});
        assert_eq!(required_str(&args, "text").expect("present"), "hi");
        for key in ["count", "empty", "absent"] {
            assert!(matches!(
                required_str(&args, key),
                Err(ToolError::MissingArgument(name)) if name == key
            ));
        }
    }

    #[test]
    fn masks_all_but_last_four_characters() {
        assert_eq!(mask_secret("secret-token-1234"), "*************1234");
        assert_eq!(mask_secret("abc"), "***");
    }

    #[test]
    fn timestamps_are_utc_with_millis() {
        let timestamp = utc_timestamp();
        assert!(timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok());
        assert_eq!(timestamp.len(), "2026-01-01T00:00:00.000Z".len());
    }
}
