//! Utilities for handling sensitive data
use reqwest::header::HeaderMap;

/// Patterns that identify sensitive header names or credential keys
pub const SENSITIVE_PATTERNS: [&str; 6] = [
    "auth",
    "secret",
    "token",
    "password",
    "credential",
    "key",
];

/// Check if a key represents sensitive data
///
/// # Arguments
/// * `key` - The key name to check
///
/// # Returns
/// `true` if the key is considered sensitive, `false` otherwise
pub fn is_sensitive(key: &str) -> bool {
    let lowercase_key = key.to_lowercase();
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| lowercase_key.contains(pattern))
}

/// Mask sensitive data with asterisks while preserving some information
///
/// # Arguments
/// * `value` - The sensitive value to mask
///
/// # Returns
/// A masked version of the value according to these rules:
/// - For values < 12 chars: Last 2 chars visible, rest masked
/// - For values >= 12 chars: Last 4 chars visible, rest masked
/// - Dashes ('-') are preserved in their original positions
pub fn mask_sensitive_value(value: &str) -> String {
    let value_len = value.len();
    let visible_suffix_len = if value_len >= 12 { 4 } else { 2.min(value_len) };

    let mut masked = String::with_capacity(value_len);
    let prefix_len = value_len.saturating_sub(visible_suffix_len);

    for (i, c) in value.chars().enumerate() {
        if i < prefix_len {
            masked.push(if c == '-' { '-' } else { '*' });
        } else {
            masked.push(c);
        }
    }

    masked
}

/// Render request headers for diagnostic output with auth-bearing values redacted.
///
/// Any header whose name contains "auth" (case-insensitive) is replaced with
/// `REDACTED`; everything else is passed through verbatim so request traces
/// stay useful for debugging version and scope headers.
pub fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_str = name.as_str().to_string();
            let rendered = if name_str.to_lowercase().contains("auth") {
                "REDACTED".to_string()
            } else {
                value.to_str().unwrap_or("<non-ascii>").to_string()
            };
            (name_str, rendered)
        })
        .collect()
}
