//! # Text Processing Utilities
//!
//! Redaction of secrets before text or JSON is logged, dumped or shown to the
//! user.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Replacement token for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Object keys whose values are always redacted in JSON documents.
const SENSITIVE_KEYS: &[&str] = &["token", "authorization", "secret", "password", "client_secret", "code"];

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Authorization headers, whatever the scheme ("User", "Bearer", ...).
        r"(?i)(authorization:\s*)([^\r\n]+)",
        r"(?i)((?:^|\b)(?:Bearer|User)\s+)([A-Za-z0-9\-._~+/]{12,}=*)",
        r#"(?i)("(?:token|secret|password|client_secret)"\s*:\s*")([^"]*)(")"#,
        r"(?i)([A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// # Example
/// ```rust
/// use befall_util::text_processing::redact_sensitive;
///
/// assert_eq!(redact_sensitive("Authorization: User abc.def"), "Authorization: [REDACTED]");
/// assert_eq!(redact_sensitive("API_TOKEN=xyz"), "API_TOKEN=[REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REDACTED}{suffix}")
            })
            .into_owned();
    }
    redacted
}

/// Replaces the value of every sensitive key in a JSON document, recursively.
pub fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                let lowered = key.to_ascii_lowercase();
                if SENSITIVE_KEYS.contains(&lowered.as_str()) && !entry.is_null() {
                    *entry = Value::String(REDACTED.to_string());
                } else {
                    redact_json(entry);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_headers_and_assignments() {
        assert_eq!(redact_sensitive("authorization: User abcdef"), "authorization: [REDACTED]");
        assert_eq!(redact_sensitive("CLIENT_SECRET=s3cr3t rest"), "CLIENT_SECRET=[REDACTED] rest");
        assert_eq!(redact_sensitive(r#"{"token": "abc"}"#), r#"{"token": "[REDACTED]"}"#);
        assert_eq!(redact_sensitive("nothing to see"), "nothing to see");
    }

    #[test]
    fn redact_json_walks_nested_values() {
        let mut value = json!({
            "session": {"user_sessions": [{"session_id": "s1", "token": "abc"}]},
            "bind_addr": "http://localhost:5173"
        });
        redact_json(&mut value);
        assert_eq!(value["session"]["user_sessions"][0]["token"], json!(REDACTED));
        assert_eq!(value["session"]["user_sessions"][0]["session_id"], json!("s1"));
        assert_eq!(value["bind_addr"], json!("http://localhost:5173"));
    }
}
