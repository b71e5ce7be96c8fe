//! Tracing setup and log-safe text helpers.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

const SENSITIVE_KEYS: [&str; 5] = ["password", "phonenumber", "idcard", "kodeuser", "token"];

/// Installs the global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info` when `RUST_LOG` is unset or invalid. Calling it twice
/// is harmless; the second call leaves the first subscriber in place.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Redacts credential values in free text before it reaches a log line.
///
/// Matches `key=value` and `key: value` forms case-insensitively, ignoring
/// punctuation inside the key (`phone_number`, `id-card`, `"kodeUser"`).
pub fn redact_sensitive(input: &str) -> String {
    input
        .split_inclusive(char::is_whitespace)
        .scan(false, |redact_next, token| {
            if *redact_next {
                *redact_next = false;
                return Some(keep_trailing_space("<redacted>", token));
            }
            Some(match split_assignment(token.trim_end()) {
                Some((key, value)) if is_sensitive(key) => {
                    if value.is_empty() {
                        *redact_next = true;
                        token.to_string()
                    } else {
                        let separator = &token[key.len()..key.len() + 1];
                        keep_trailing_space(&format!("{key}{separator}<redacted>"), token)
                    }
                }
                _ => token.to_string(),
            })
        })
        .collect()
}

fn split_assignment(token: &str) -> Option<(&str, &str)> {
    let position = token.find(['=', ':'])?;
    Some((&token[..position], &token[position + 1..]))
}

fn is_sensitive(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    SENSITIVE_KEYS.iter().any(|sensitive| normalized == *sensitive)
}

fn keep_trailing_space(replacement: &str, original: &str) -> String {
    let trimmed = original.trim_end();
    format!("{replacement}{}", &original[trimmed.len()..])
}
