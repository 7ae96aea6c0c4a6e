//! # Schema validation
//!
//! Checks a JSON value against a declarative [`Schema`]: required keys,
//! declared types, nested object shapes and format constraints. A schema is a
//! floor, not a ceiling: undeclared fields are accepted as-is.

pub mod resources;

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;

/// Runtime type of a JSON value as the validator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    /// A number with no fractional part.
    Integer,
    /// Any number, integers included.
    Number,
    Boolean,
    List,
    Object,
    Null,
}

impl FieldType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => FieldType::String,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Integer,
            Value::Number(_) => FieldType::Number,
            Value::Bool(_) => FieldType::Boolean,
            Value::Array(_) => FieldType::List,
            Value::Object(_) => FieldType::Object,
            Value::Null => FieldType::Null,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        let actual = FieldType::of(value);
        actual == self || (self == FieldType::Number && actual == FieldType::Integer)
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::List => "list",
            FieldType::Object => "object",
            FieldType::Null => "null",
        };
        write!(f, "{label}")
    }
}

/// Value-level constraint checked independently of the field's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// `local@domain` where the domain contains at least one `.`.
    Email,
    NonEmpty,
    /// Number strictly greater than zero.
    Positive,
    /// Absolute `http` or `https` URL with a host.
    Url,
}

impl Format {
    pub fn check(self, value: &Value) -> bool {
        match self {
            Format::Email => value.as_str().is_some_and(is_email),
            Format::NonEmpty => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            Format::Positive => value.as_f64().is_some_and(|n| n > 0.0),
            Format::Url => value.as_str().is_some_and(is_http_url),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Format::Email => "email address",
            Format::NonEmpty => "non-empty string",
            Format::Positive => "positive number",
            Format::Url => "http(s) URL",
        }
    }
}

fn is_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !raw.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

fn is_http_url(raw: &str) -> bool {
    reqwest::Url::parse(raw)
        .map(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub nested: Option<Schema>,
    pub format: Option<Format>,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            nested: None,
            format: None,
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type)
        }
    }

    /// Nested object shape. Forces the field type to `Object`.
    pub fn nested(mut self, schema: Schema) -> Self {
        self.field_type = FieldType::Object;
        self.nested = Some(schema);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// Expectation schema for one JSON object shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|f| f.required).map(|f| f.name.as_str())
    }
}

/// Category of a failed assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    MissingField,
    TypeMismatch,
    FormatInvalid,
    ValueMismatch,
    InvalidBody,
    UnexpectedStatus,
    HeaderMissing,
    HeaderUnexpected,
    HeaderMismatch,
    PerformanceBudgetExceeded,
    LimitExceeded,
    FilterViolation,
    SortViolation,
    Timeout,
    TransportError,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::MissingField => "MissingField",
            FailureKind::TypeMismatch => "TypeMismatch",
            FailureKind::FormatInvalid => "FormatInvalid",
            FailureKind::ValueMismatch => "ValueMismatch",
            FailureKind::InvalidBody => "InvalidBody",
            FailureKind::UnexpectedStatus => "UnexpectedStatus",
            FailureKind::HeaderMissing => "HeaderMissing",
            FailureKind::HeaderUnexpected => "HeaderUnexpected",
            FailureKind::HeaderMismatch => "HeaderMismatch",
            FailureKind::PerformanceBudgetExceeded => "PerformanceBudgetExceeded",
            FailureKind::LimitExceeded => "LimitExceeded",
            FailureKind::FilterViolation => "FilterViolation",
            FailureKind::SortViolation => "SortViolation",
            FailureKind::Timeout => "Timeout",
            FailureKind::TransportError => "TransportError",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Dotted path of the offending field, `$` for the whole body.
    pub field: String,
    pub expected: String,
    pub actual: String,
    pub reason: FailureKind,
}

impl Failure {
    pub fn new(
        reason: FailureKind,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
            reason,
        }
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at `{}`: expected {}, got {}",
            self.reason, self.field, self.expected, self.actual
        )
    }
}

/// Ordered outcome of a set of assertions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationResult {
    failures: Vec<Failure>,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn from_failures(failures: Vec<Failure>) -> Self {
        Self { failures }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn has(&self, reason: FailureKind) -> bool {
        self.failures.iter().any(|f| f.reason == reason)
    }

    /// Append another result's failures after this one's.
    pub fn and(mut self, other: ValidationResult) -> Self {
        self.failures.extend(other.failures);
        self
    }

    pub fn with_failure(mut self, failure: Failure) -> Self {
        self.failures.push(failure);
        self
    }
}

impl Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return write!(f, "passed");
        }
        writeln!(f, "{} failure(s):", self.failures.len())?;
        for failure in &self.failures {
            writeln!(f, "  - {failure}")?;
        }
        Ok(())
    }
}

pub const ROOT: &str = "$";

/// Validate `value` against `schema`.
pub fn validate(schema: &Schema, value: &Value) -> ValidationResult {
    let mut failures = Vec::new();
    validate_into(schema, value, "", &mut failures);
    ValidationResult::from_failures(failures)
}

/// Validate with every reported field prefixed by `prefix`.
pub fn validate_at(schema: &Schema, value: &Value, prefix: &str) -> ValidationResult {
    let mut failures = Vec::new();
    validate_into(schema, value, prefix, &mut failures);
    ValidationResult::from_failures(failures)
}

fn validate_into(schema: &Schema, value: &Value, prefix: &str, failures: &mut Vec<Failure>) {
    let Some(object) = value.as_object() else {
        let field = if prefix.is_empty() { ROOT } else { prefix };
        failures.push(Failure::new(
            FailureKind::TypeMismatch,
            field,
            format!("{} object", schema.name),
            FieldType::of(value).to_string(),
        ));
        return;
    };

    for spec in &schema.fields {
        let path = join_path(prefix, &spec.name);
        let Some(field_value) = object.get(&spec.name) else {
            if spec.required {
                failures.push(Failure::new(
                    FailureKind::MissingField,
                    path,
                    spec.field_type.to_string(),
                    "absent",
                ));
            }
            continue;
        };

        let type_ok = spec.field_type.accepts(field_value);
        if !type_ok {
            failures.push(Failure::new(
                FailureKind::TypeMismatch,
                path.clone(),
                spec.field_type.to_string(),
                FieldType::of(field_value).to_string(),
            ));
        }

        if let Some(format) = spec.format {
            if !format.check(field_value) {
                failures.push(Failure::new(
                    FailureKind::FormatInvalid,
                    path.clone(),
                    format.describe(),
                    describe_value(field_value),
                ));
            }
        }

        if let (true, Some(nested)) = (type_ok, &spec.nested) {
            validate_into(nested, field_value, &path, failures);
        }
    }
}

pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Short rendering of a value for failure messages.
pub fn describe_value(value: &Value) -> String {
    const MAX: usize = 80;
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX {
        return rendered;
    }
    let truncated: String = rendered.chars().take(MAX).collect();
    format!("{truncated}...")
}
