//! Response header expectations.

use crate::http::CallResult;
use crate::schema::{Failure, FailureKind, ValidationResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderRule {
    /// Header must be present, any value.
    Present(&'static str),
    /// Header must not be sent at all.
    Absent(&'static str),
    /// Header must be present and contain the given substring (case-insensitive).
    Contains(&'static str, &'static str),
}

/// JSON content type plus a cache-control header of any value.
pub const JSON_DEFAULTS: &[HeaderRule] = &[
    HeaderRule::Contains("content-type", "application/json"),
    HeaderRule::Present("cache-control"),
];

pub fn check_headers(response: &CallResult, rules: &[HeaderRule]) -> ValidationResult {
    let mut failures = Vec::new();

    for rule in rules {
        match *rule {
            HeaderRule::Present(name) => {
                if response.header(name).is_none() {
                    failures.push(header_failure(
                        FailureKind::HeaderMissing,
                        name,
                        "present",
                        "absent",
                    ));
                }
            }
            HeaderRule::Absent(name) => {
                if let Some(value) = response.header(name) {
                    failures.push(header_failure(
                        FailureKind::HeaderUnexpected,
                        name,
                        "absent",
                        value,
                    ));
                }
            }
            HeaderRule::Contains(name, needle) => match response.header(name) {
                None => failures.push(header_failure(
                    FailureKind::HeaderMissing,
                    name,
                    needle,
                    "absent",
                )),
                Some(value) if !contains_ignore_case(value, needle) => {
                    failures.push(header_failure(FailureKind::HeaderMismatch, name, needle, value));
                }
                Some(_) => {}
            },
        }
    }

    ValidationResult::from_failures(failures)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

fn header_failure(reason: FailureKind, name: &str, expected: &str, actual: &str) -> Failure {
    Failure::new(reason, format!("headers.{name}"), expected, actual)
}
