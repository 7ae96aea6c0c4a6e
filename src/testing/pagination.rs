//! Collection queries: limit, offset, filter and sort checks.

use std::cmp::Ordering;

use serde_json::Value;

use super::cases::{check_status, invalid_body};
use super::gate::with_budget;
use super::headers::{HeaderRule, check_headers};
use crate::error::Result;
use crate::http::{CallResult, HttpMethod, RequestInput, Session};
use crate::resources::ResourceKind;
use crate::schema::{
    Failure, FailureKind, FieldType, ValidationResult, describe_value, validate_at,
};

const LIST_HEADERS: &[HeaderRule] = &[HeaderRule::Contains("content-type", "application/json")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn allows(self, ordering: Ordering) -> bool {
        match self {
            SortOrder::Asc => ordering != Ordering::Greater,
            SortOrder::Desc => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub order: SortOrder,
}

/// Parameters of one collection query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub start: Option<usize>,
    pub page: Option<usize>,
    pub sort: Option<SortSpec>,
    pub filters: Vec<(String, Value)>,
}

impl PageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn sort_by(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortSpec {
            key: key.into(),
            order,
        });
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Number of leading items skipped by this query.
    pub fn offset(&self) -> usize {
        match (self.start, self.page, self.limit) {
            (Some(start), _, _) => start,
            (None, Some(page), Some(limit)) => page.saturating_sub(1) * limit,
            _ => 0,
        }
    }

    /// A GET against `path` carrying this query.
    pub fn to_request(&self, path: &str) -> RequestInput {
        self.to_query_pairs()
            .into_iter()
            .fold(RequestInput::new(HttpMethod::Get, path), |request, (key, value)| {
                request.with_query(key, value)
            })
    }

    /// Query pairs in the backend's `_limit`/`_start`/`_page`/`_sort`/`_order` dialect.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.filters {
            pairs.push((key.clone(), render(value)));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("_sort".to_string(), sort.key.clone()));
            pairs.push(("_order".to_string(), sort.order.as_str().to_string()));
        }
        if let Some(start) = self.start {
            pairs.push(("_start".to_string(), start.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("_page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("_limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Query-string filters arrive as text, so `"1"` matches `1`.
fn matches_filter(got: Option<&Value>, want: &Value) -> bool {
    match got {
        Some(got) => got == want || render(got) == render(want),
        None => false,
    }
}

/// Total order for sortable JSON scalars; `None` when values are not comparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn label(item: &Value, index: usize, id_field: &str) -> String {
    match item.get(id_field) {
        Some(id) => format!("{id_field}={}", render(id)),
        None => format!("[{index}]"),
    }
}

/// Check limit, filter and sort of an already fetched page.
pub fn check_page(query: &PageQuery, items: &[Value], id_field: &str) -> ValidationResult {
    let mut failures = Vec::new();

    if let Some(limit) = query.limit {
        if items.len() > limit {
            failures.push(Failure::new(
                FailureKind::LimitExceeded,
                "length",
                format!("<= {limit}"),
                items.len().to_string(),
            ));
        }
    }

    for (key, want) in &query.filters {
        let offending: Vec<_> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| !matches_filter(item.get(key), want))
            .map(|(index, item)| label(item, index, id_field))
            .collect();
        if !offending.is_empty() {
            failures.push(Failure::new(
                FailureKind::FilterViolation,
                key.clone(),
                format!("{key} == {}", render(want)),
                offending.join(", "),
            ));
        }
    }

    if let Some(sort) = &query.sort {
        let out_of_order = items.windows(2).enumerate().find(|(_, pair)| {
            match (pair[0].get(&sort.key), pair[1].get(&sort.key)) {
                (Some(a), Some(b)) => {
                    !compare_values(a, b).is_some_and(|ord| sort.order.allows(ord))
                }
                _ => true,
            }
        });
        if let Some((index, pair)) = out_of_order {
            let key_of = |item: &Value| {
                item.get(&sort.key)
                    .map(describe_value)
                    .unwrap_or_else(|| "absent".into())
            };
            failures.push(Failure::new(
                FailureKind::SortViolation,
                sort.key.clone(),
                format!("{} order at [{index}]..[{}]", sort.order.as_str(), index + 1),
                format!("{} then {}", key_of(&pair[0]), key_of(&pair[1])),
            ));
        }
    }

    ValidationResult::from_failures(failures)
}

/// `page` must equal the slice of `full` starting at `offset`, compared by id.
pub fn check_prefix(
    page: &[Value],
    full: &[Value],
    offset: usize,
    id_field: &str,
) -> ValidationResult {
    let failures = page
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let want = full.get(offset + index).and_then(|f| f.get(id_field));
            let got = item.get(id_field);
            (want.is_none() || got != want).then(|| {
                Failure::new(
                    FailureKind::ValueMismatch,
                    format!("[{index}].{id_field}"),
                    want.map(describe_value).unwrap_or_else(|| "no item".into()),
                    got.map(describe_value).unwrap_or_else(|| "absent".into()),
                )
            })
        })
        .collect();
    ValidationResult::from_failures(failures)
}

/// A fetched page and every failure found on it.
#[derive(Debug, Clone)]
pub struct PageCheck {
    pub response: CallResult,
    pub items: Vec<Value>,
    pub result: ValidationResult,
}

fn list_items(response: &CallResult) -> (Vec<Value>, ValidationResult) {
    match &response.body {
        Value::Array(items) => (items.clone(), ValidationResult::pass()),
        _ if !response.json => (
            Vec::new(),
            ValidationResult::pass().with_failure(invalid_body(response)),
        ),
        other => (
            Vec::new(),
            ValidationResult::pass().with_failure(Failure::new(
                FailureKind::TypeMismatch,
                "$",
                FieldType::List.to_string(),
                FieldType::of(other).to_string(),
            )),
        ),
    }
}

fn check_items(kind: ResourceKind, items: &[Value]) -> ValidationResult {
    items
        .iter()
        .enumerate()
        .fold(ValidationResult::pass(), |acc, (index, item)| {
            acc.and(validate_at(kind.schema(), item, &format!("[{index}]")))
        })
}

/// Issue a collection query for `kind` and check the result set.
pub async fn validate_page(
    session: &Session,
    kind: ResourceKind,
    query: &PageQuery,
    budget_ms: u64,
) -> Result<PageCheck> {
    let descriptor = kind.descriptor();
    let request = query.to_request(descriptor.base_path);
    let gated = with_budget(budget_ms, session.send(&request)).await?;

    let mut result = ValidationResult::pass();
    if let Some(failure) = check_status(&[200], gated.response.status) {
        result = result.with_failure(failure);
    }
    let (items, shape) = list_items(&gated.response);
    result = result
        .and(shape)
        .and(check_items(kind, &items))
        .and(check_page(query, &items, descriptor.id_field));

    // Without filters the seeded collection fills every page it can.
    if let (Some(limit), true) = (query.limit, query.filters.is_empty()) {
        let available = descriptor.known_count.saturating_sub(query.offset());
        let want = limit.min(available);
        if items.len() < want {
            result = result.with_failure(Failure::new(
                FailureKind::ValueMismatch,
                "length",
                want.to_string(),
                items.len().to_string(),
            ));
        }
    }

    result = result.and(check_headers(&gated.response, LIST_HEADERS)).and(gated.outcome);

    Ok(PageCheck {
        response: gated.response,
        items,
        result,
    })
}

/// Fetch the whole collection and check its size against the seeded count.
pub async fn validate_collection(
    session: &Session,
    kind: ResourceKind,
    budget_ms: u64,
) -> Result<PageCheck> {
    let mut check = validate_page(session, kind, &PageQuery::new(), budget_ms).await?;
    let known = kind.descriptor().known_count;
    if check.response.status == 200 && check.items.len() != known {
        check.result = check.result.with_failure(Failure::new(
            FailureKind::ValueMismatch,
            "length",
            known.to_string(),
            check.items.len().to_string(),
        ));
    }
    Ok(check)
}
