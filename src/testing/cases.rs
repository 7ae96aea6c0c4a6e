//! Data-driven case generation and execution.
//!
//! A parameter table is a plain slice of typed rows. Expanding it yields a
//! lazy, finite iterator of [`TestCase`] values; expanding again (or cloning
//! the iterator) restarts from the first row.

use std::fmt::{self, Display};
use std::time::Instant;

use serde_json::{Map, Value};

use super::gate::with_budget;
use super::headers::{HeaderRule, JSON_DEFAULTS, check_headers};
use super::report::{CaseReport, Outcome, RunReport};
use crate::config::DEFAULT_BUDGET_MS;
use crate::http::{CallResult, HttpMethod, RequestInput, Session};
use crate::resources::ResourceKind;
use crate::schema::{
    Failure, FailureKind, ROOT, Schema, ValidationResult, describe_value, resources, validate,
};

/// Identifier as written in a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdInput {
    Numeric(i64),
    /// Sent verbatim as the path segment, e.g. `"abc"`.
    Raw(&'static str),
}

impl IdInput {
    pub fn segment(&self) -> String {
        match self {
            IdInput::Numeric(id) => id.to_string(),
            IdInput::Raw(raw) => (*raw).to_string(),
        }
    }
}

impl Display for IdInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment())
    }
}

/// Expected outcome class of a read row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Found,
    NotFound,
    /// Status pinned by the table author for this backend.
    Malformed { status: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseRow {
    pub input: IdInput,
    pub expect: Expectation,
}

impl CaseRow {
    pub const fn found(id: i64) -> Self {
        Self {
            input: IdInput::Numeric(id),
            expect: Expectation::Found,
        }
    }

    pub const fn not_found(id: i64) -> Self {
        Self {
            input: IdInput::Numeric(id),
            expect: Expectation::NotFound,
        }
    }

    pub const fn malformed(raw: &'static str, status: u16) -> Self {
        Self {
            input: IdInput::Raw(raw),
            expect: Expectation::Malformed { status },
        }
    }
}

/// One mutating row: method, optional target id, body and pinned status.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRow {
    pub method: HttpMethod,
    pub target: Option<IdInput>,
    pub body: Option<Value>,
    pub expected_status: u16,
}

impl WriteRow {
    pub fn create(body: Value, expected_status: u16) -> Self {
        Self {
            method: HttpMethod::Post,
            target: None,
            body: Some(body),
            expected_status,
        }
    }

    pub fn update(id: i64, body: Value, expected_status: u16) -> Self {
        Self {
            method: HttpMethod::Put,
            target: Some(IdInput::Numeric(id)),
            body: Some(body),
            expected_status,
        }
    }

    pub fn patch(id: i64, body: Value, expected_status: u16) -> Self {
        Self {
            method: HttpMethod::Patch,
            ..Self::update(id, body, expected_status)
        }
    }

    pub fn delete(id: i64, expected_status: u16) -> Self {
        Self {
            method: HttpMethod::Delete,
            target: Some(IdInput::Numeric(id)),
            body: None,
            expected_status,
        }
    }
}

/// A fully specified check of one call. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    pub request_body: Option<Value>,
    pub expected_status: u16,
    pub expected_schema: Option<&'static Schema>,
    /// Fields the response body must carry with exactly these values.
    pub expected_fields: Map<String, Value>,
    pub header_rules: &'static [HeaderRule],
    pub budget_ms: u64,
}

impl TestCase {
    pub fn request(&self) -> RequestInput {
        let request = RequestInput::new(self.method, self.path.as_str());
        match &self.request_body {
            Some(body) => request.with_body(body.clone()),
            None => request,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cases<'a> {
    kind: ResourceKind,
    rows: std::slice::Iter<'a, CaseRow>,
    budget_ms: u64,
}

impl Cases<'_> {
    pub fn budget(mut self, budget_ms: u64) -> Self {
        self.budget_ms = budget_ms;
        self
    }
}

impl Iterator for Cases<'_> {
    type Item = TestCase;

    fn next(&mut self) -> Option<TestCase> {
        let row = self.rows.next()?;
        Some(read_case(self.kind, row, self.budget_ms))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Cases<'_> {}

/// Expand a table of read rows for `kind`.
pub fn expand(kind: ResourceKind, table: &[CaseRow]) -> Cases<'_> {
    Cases {
        kind,
        rows: table.iter(),
        budget_ms: DEFAULT_BUDGET_MS,
    }
}

const NO_HEADERS: &[HeaderRule] = &[];

fn read_case(kind: ResourceKind, row: &CaseRow, budget_ms: u64) -> TestCase {
    let descriptor = kind.descriptor();
    let path = descriptor.item_path(&row.input.segment());

    let (expected_status, expected_schema, header_rules) = match row.expect {
        Expectation::Found => (200, Some(kind.schema()), JSON_DEFAULTS),
        Expectation::NotFound => (404, None, NO_HEADERS),
        Expectation::Malformed { status } => (status, None, NO_HEADERS),
    };

    let mut expected_fields = Map::new();
    if let (Expectation::Found, IdInput::Numeric(id)) = (row.expect, row.input) {
        expected_fields.insert(descriptor.id_field.to_string(), Value::from(id));
    }

    TestCase {
        name: format!("GET {path} -> {expected_status}"),
        method: HttpMethod::Get,
        path,
        request_body: None,
        expected_status,
        expected_schema,
        expected_fields,
        header_rules,
        budget_ms,
    }
}

#[derive(Debug, Clone)]
pub struct WriteCases<'a> {
    kind: ResourceKind,
    rows: std::slice::Iter<'a, WriteRow>,
    budget_ms: u64,
}

impl WriteCases<'_> {
    pub fn budget(mut self, budget_ms: u64) -> Self {
        self.budget_ms = budget_ms;
        self
    }
}

impl Iterator for WriteCases<'_> {
    type Item = TestCase;

    fn next(&mut self) -> Option<TestCase> {
        let row = self.rows.next()?;
        Some(write_case(self.kind, row, self.budget_ms))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for WriteCases<'_> {}

/// Expand a table of mutating rows for `kind`.
pub fn expand_writes(kind: ResourceKind, table: &[WriteRow]) -> WriteCases<'_> {
    WriteCases {
        kind,
        rows: table.iter(),
        budget_ms: DEFAULT_BUDGET_MS,
    }
}

fn write_case(kind: ResourceKind, row: &WriteRow, budget_ms: u64) -> TestCase {
    let descriptor = kind.descriptor();
    let path = match row.target {
        Some(id) => descriptor.item_path(&id.segment()),
        None => descriptor.base_path.to_string(),
    };

    let success = (200..300).contains(&row.expected_status);
    let expected_schema = match row.method {
        HttpMethod::Post if success => Some(&*resources::CREATED),
        _ => None,
    };

    // Echo only applies to successful writes that carried a body.
    let expected_fields = match (&row.body, success, row.method.sends_body()) {
        (Some(Value::Object(body)), true, true) => body.clone(),
        _ => Map::new(),
    };

    TestCase {
        name: format!("{} {path} -> {}", row.method, row.expected_status),
        method: row.method,
        path,
        request_body: row.body.clone(),
        expected_status: row.expected_status,
        expected_schema,
        expected_fields,
        header_rules: NO_HEADERS,
        budget_ms,
    }
}

/// Every field of `expected` must appear in `body` with an equal value.
pub fn check_echo(expected: &Map<String, Value>, body: &Value) -> Vec<Failure> {
    expected
        .iter()
        .filter_map(|(key, want)| {
            let got = body.get(key);
            (got != Some(want)).then(|| {
                Failure::new(
                    FailureKind::ValueMismatch,
                    key.clone(),
                    describe_value(want),
                    got.map(describe_value).unwrap_or_else(|| "absent".to_string()),
                )
            })
        })
        .collect()
}

pub fn check_status(expected: &[u16], actual: u16) -> Option<Failure> {
    (!expected.contains(&actual)).then(|| {
        let expected = expected.iter().map(u16::to_string).collect::<Vec<_>>().join(" or ");
        Failure::new(FailureKind::UnexpectedStatus, "status", expected, actual.to_string())
    })
}

pub fn invalid_body(response: &CallResult) -> Failure {
    Failure::new(
        FailureKind::InvalidBody,
        ROOT,
        "JSON body",
        describe_value(&Value::String(response.raw_body.clone())),
    )
}

pub fn check_schema(schema: &Schema, response: &CallResult) -> ValidationResult {
    if !response.json {
        return ValidationResult::pass().with_failure(invalid_body(response));
    }
    validate(schema, &response.body)
}

/// Evaluate every assertion of `case` against `response`.
///
/// All checks run even when an earlier one fails.
pub fn check_response(case: &TestCase, response: &CallResult) -> ValidationResult {
    let mut result = ValidationResult::pass();
    if let Some(failure) = check_status(&[case.expected_status], response.status) {
        result = result.with_failure(failure);
    }
    if let Some(schema) = case.expected_schema {
        result = result.and(check_schema(schema, response));
    }
    result = result.and(ValidationResult::from_failures(check_echo(
        &case.expected_fields,
        &response.body,
    )));
    result.and(check_headers(response, case.header_rules))
}

/// Run one case through the session and the performance gate.
pub async fn execute(session: &Session, case: &TestCase) -> CaseReport {
    let started = Instant::now();
    let request = case.request();
    let call = session.send(&request);

    let outcome = match with_budget(case.budget_ms, call).await {
        Ok(gated) => {
            Outcome::from_validation(check_response(case, &gated.response).and(gated.outcome))
        }
        Err(err) => Outcome::from_error(&err),
    };

    CaseReport {
        name: case.name.clone(),
        outcome,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

/// Execute cases in order and collect a report.
pub async fn run_cases<I>(session: &Session, cases: I) -> RunReport
where
    I: IntoIterator<Item = TestCase>,
{
    let mut report = RunReport::new();
    for case in cases {
        report.record(execute(session, &case).await);
    }
    report.log_summary();
    report
}
