//! Balanced-brace JSON extraction from free-text model output.
//!
//! Model responses wrap the JSON object in prose, markdown fences or
//! stray newlines. Instead of a greedy regex, scan for the first
//! balanced brace-delimited span (string- and escape-aware), then
//! parse it strictly.

use serde_json::Value;

/// Find the first balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals are ignored. Returns the span
/// as a slice of the input.
pub fn first_object_span(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and strictly parse the first JSON object in `text`.
///
/// Raw newlines inside string literals (common in transcribed model
/// output) are normalized to spaces before parsing.
pub fn extract_object(text: &str) -> Option<Value> {
    let span = first_object_span(text)?;
    serde_json::from_str(span)
        .ok()
        .or_else(|| serde_json::from_str(&normalize_string_newlines(span)).ok())
}

/// Replace raw control characters inside string literals with spaces.
fn normalize_string_newlines(span: &str) -> String {
    let mut out = String::with_capacity(span.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in span.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if c == '\n' || c == '\r' || c == '\t' {
                out.push(' ');
                continue;
            }
        } else if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    out
}
