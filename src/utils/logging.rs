//! Structured logging and log-safety utilities.
//!
//! This module configures the `tracing` ecosystem for the application and
//! keeps multi-megabyte base64 image payloads out of log sinks.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keys whose string values hold inline image data.
const IMAGE_KEYS: &[&str] = &["\"image_base64\"", "\"imageBase64\""];

/// Initializes the global tracing subscriber for the application.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line human-readable output.
/// - `pretty` (default): Multi-line, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Replaces inline image data in a raw JSON body with a size marker.
///
/// Scans for the `image_base64` / `imageBase64` keys and swaps their string
/// value for `[REDACTED n chars]`. Anything that does not look like a string
/// value is left alone.
pub fn redact_image_payload(input: &str) -> String {
    let mut result = input.to_string();

    for key in IMAGE_KEYS {
        let mut search_from = 0;
        while let Some(found) = result[search_from..].find(key) {
            let after_key = search_from + found + key.len();

            // Expect `:` then an opening quote, allowing whitespace
            let rest = &result[after_key..];
            let Some(colon) = rest.find(|c: char| !c.is_whitespace()) else { break };
            if !rest[colon..].starts_with(':') {
                search_from = after_key;
                continue;
            }
            let after_colon = &rest[colon + 1..];
            let Some(quote) = after_colon.find(|c: char| !c.is_whitespace()) else { break };
            if !after_colon[quote..].starts_with('"') {
                search_from = after_key;
                continue;
            }

            let value_start = after_key + colon + 1 + quote + 1;
            let Some(value_len) = string_value_len(&result[value_start..]) else { break };

            let marker = format!("[REDACTED {} chars]", value_len);
            result.replace_range(value_start..value_start + value_len, &marker);
            search_from = value_start + marker.len();
        }
    }

    result
}

/// Byte length of a JSON string body up to (not including) its closing quote.
fn string_value_len(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}
