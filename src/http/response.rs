use std::collections::HashMap;

use reqwest::header::HeaderMap;
use serde_json::Value;

/// What one HTTP call produced.
///
/// Header names are lower-cased. `body` is `Value::Null` when the response
/// body was empty or not JSON; the raw text is kept in `raw_body`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Value,
    pub raw_body: String,
    pub json: bool,
    pub elapsed_ms: u64,
}

impl CallResult {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("text/plain")
    }
}

/// Lower-cased header map. Repeated headers are joined with `", "`; values
/// that are not valid UTF-8 are decoded lossily.
pub fn collect_headers(raw: &HeaderMap) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in raw {
        let value = String::from_utf8_lossy(value.as_bytes());
        headers
            .entry(name.as_str().to_ascii_lowercase())
            .and_modify(|joined| {
                joined.push_str(", ");
                joined.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    headers
}

/// Parse a response body, falling back to `Null` for empty or non-JSON text.
pub fn parse_body(raw: &str) -> (Value, bool) {
    if raw.trim().is_empty() {
        return (Value::Null, false);
    }
    match serde_json::from_str(raw) {
        Ok(value) => (value, true),
        Err(_) => (Value::Null, false),
    }
}
