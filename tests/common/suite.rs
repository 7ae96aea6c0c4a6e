//! Contract tables for the JSONPlaceholder API and runners shared by the
//! mock-backed and live suites.

use restcontract::resources::ResourceKind;
use restcontract::testing::cases::{CaseRow, TestCase, WriteRow, expand, expand_writes, run_cases};
use restcontract::testing::headers::HeaderRule;
use restcontract::testing::lifecycle::{
    LifecyclePlan, LifecycleTracker, MutationTarget, ReadPolicy,
};
use restcontract::testing::pagination::{
    PageCheck, PageQuery, SortOrder, check_prefix, validate_collection, validate_page,
};
use restcontract::testing::report::{CaseReport, Outcome, RunReport};
use restcontract::{HttpMethod, Result, Session};
use serde_json::{Map, json};

pub const BUDGET_MS: u64 = 2_000;

pub const POST_READS: &[CaseRow] = &[
    CaseRow::found(1),
    CaseRow::found(50),
    CaseRow::found(100),
    CaseRow::not_found(101),
    CaseRow::not_found(0),
    CaseRow::not_found(-1),
    CaseRow::malformed("abc", 404),
];

pub const USER_READS: &[CaseRow] = &[
    CaseRow::found(1),
    CaseRow::found(5),
    CaseRow::found(10),
    CaseRow::not_found(11),
    CaseRow::not_found(0),
    CaseRow::not_found(-1),
];

pub const COMMENT_READS: &[CaseRow] =
    &[CaseRow::found(1), CaseRow::found(500), CaseRow::not_found(501)];

pub const ALBUM_READS: &[CaseRow] =
    &[CaseRow::found(1), CaseRow::found(100), CaseRow::not_found(101)];

pub const PHOTO_READS: &[CaseRow] =
    &[CaseRow::found(1), CaseRow::found(5000), CaseRow::not_found(5001)];

pub fn post_writes() -> Vec<WriteRow> {
    vec![
        WriteRow::create(json!({"title": "Test Post", "body": "Test Body", "userId": 1}), 201),
        WriteRow::create(json!({"title": "", "body": "Test Body", "userId": 1}), 201),
        WriteRow::create(json!({"title": "Test Post", "body": "", "userId": 1}), 201),
        WriteRow::create(json!({}), 201),
        WriteRow::update(
            1,
            json!({"title": "Updated Title", "body": "Updated Body", "userId": 1}),
            200,
        ),
        WriteRow::update(50, json!({"title": "Another Update"}), 200),
        WriteRow::update(100, json!({"body": "Only body update"}), 200),
        WriteRow::update(101, json!({"title": "Update non-existent"}), 500),
        WriteRow::patch(1, json!({"title": "Patched"}), 200),
        WriteRow::delete(1, 200),
        WriteRow::delete(50, 200),
        WriteRow::delete(100, 200),
        WriteRow::delete(101, 200),
    ]
}

/// JSON content type, a cache policy and no CORS grant on collections.
pub const COLLECTION_HEADERS: &[HeaderRule] = &[
    HeaderRule::Contains("content-type", "application/json"),
    HeaderRule::Present("cache-control"),
    HeaderRule::Absent("access-control-allow-origin"),
];

pub async fn run_header_policy(session: &Session) -> RunReport {
    let case = TestCase {
        name: "GET /posts headers".to_string(),
        method: HttpMethod::Get,
        path: "/posts".to_string(),
        request_body: None,
        expected_status: 200,
        expected_schema: None,
        expected_fields: Map::new(),
        header_rules: COLLECTION_HEADERS,
        budget_ms: BUDGET_MS,
    };
    run_cases(session, [case]).await
}

pub async fn run_reads(session: &Session) -> RunReport {
    let cases = expand(ResourceKind::Post, POST_READS)
        .chain(expand(ResourceKind::User, USER_READS))
        .chain(expand(ResourceKind::Comment, COMMENT_READS))
        .chain(expand(ResourceKind::Album, ALBUM_READS))
        .chain(expand(ResourceKind::Photo, PHOTO_READS));
    run_cases(session, cases).await
}

pub async fn run_writes(session: &Session) -> RunReport {
    let rows = post_writes();
    run_cases(session, expand_writes(ResourceKind::Post, &rows)).await
}

fn page_report(name: String, check: Result<PageCheck>) -> CaseReport {
    match check {
        Ok(check) => CaseReport {
            name,
            duration_ms: check.response.elapsed_ms,
            outcome: Outcome::from_validation(check.result),
        },
        Err(err) => CaseReport {
            name,
            duration_ms: 0,
            outcome: Outcome::from_error(&err),
        },
    }
}

pub async fn run_collections(session: &Session) -> RunReport {
    let mut report = RunReport::new();
    for kind in ResourceKind::ALL {
        let check = validate_collection(session, kind, BUDGET_MS).await;
        report.record(page_report(format!("GET {} (all)", kind.descriptor().base_path), check));
    }
    report.log_summary();
    report
}

pub async fn run_pagination(session: &Session) -> RunReport {
    let queries = [
        ("limit 10", PageQuery::new().limit(10)),
        ("filter userId=1", PageQuery::new().filter("userId", 1)),
        ("limit 5", PageQuery::new().limit(5)),
        ("sort id asc", PageQuery::new().sort_by("id", SortOrder::Asc)),
        ("sort id desc", PageQuery::new().sort_by("id", SortOrder::Desc)),
        ("sort title asc, limit 20", PageQuery::new().sort_by("title", SortOrder::Asc).limit(20)),
        ("page 3 of 10", PageQuery::new().page(3).limit(10)),
    ];

    let mut report = RunReport::new();
    for (label, query) in queries {
        let check = validate_page(session, ResourceKind::Post, &query, BUDGET_MS).await;
        report.record(page_report(format!("GET /posts ({label})"), check));
    }

    let window = PageQuery::new().start(10).limit(5);
    let prefix = match (
        validate_page(session, ResourceKind::Post, &window, BUDGET_MS).await,
        validate_page(session, ResourceKind::Post, &PageQuery::new(), BUDGET_MS).await,
    ) {
        (Ok(mut page), Ok(full)) => {
            let prefix = check_prefix(&page.items, &full.items, window.offset(), "id");
            page.result = page.result.and(prefix);
            Ok(page)
        }
        (Err(err), _) | (_, Err(err)) => Err(err),
    };
    report.record(page_report("GET /posts (start 10, limit 5)".to_string(), prefix));

    report.log_summary();
    report
}

pub fn lifecycle_plans() -> Vec<LifecyclePlan> {
    vec![
        LifecyclePlan::new(
            ResourceKind::Post,
            json!({"title": "lifecycle", "body": "created by the harness", "userId": 1}),
            json!({"title": "lifecycle updated", "body": "replaced", "userId": 1}),
        )
        .target(MutationTarget::Fixture(1)),
        LifecyclePlan::new(
            ResourceKind::Post,
            json!({"title": "probed", "body": "read after create", "userId": 1}),
            json!({"title": "patched"}),
        )
        .read(ReadPolicy::Probe)
        .patch()
        .target(MutationTarget::Fixture(2)),
    ]
}

pub async fn run_lifecycles(session: &Session) -> RunReport {
    let tracker = LifecycleTracker::new(session);
    let mut report = RunReport::new();
    for plan in lifecycle_plans() {
        let started = std::time::Instant::now();
        let outcome = tracker.run(&plan).await.outcome();
        let method = if plan.update_method == HttpMethod::Patch { "patch" } else { "put" };
        report.record(CaseReport {
            name: format!("{} lifecycle ({method})", plan.kind),
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
        });
    }
    report.log_summary();
    report
}
