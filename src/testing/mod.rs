//! # Contract checks
//!
//! Table-driven case generation, the performance gate, header rules,
//! pagination checks and the resource lifecycle tracker, plus the reports
//! they produce.

pub mod cases;
pub mod gate;
pub mod headers;
pub mod lifecycle;
pub mod pagination;
pub mod report;

pub use cases::{
    CaseRow, Cases, Expectation, IdInput, TestCase, WriteCases, WriteRow, expand, expand_writes,
    run_cases,
};
pub use gate::{Gated, with_budget};
pub use headers::{HeaderRule, JSON_DEFAULTS, check_headers};
pub use lifecycle::{
    LifecyclePlan, LifecycleReport, LifecycleState, LifecycleTracker, MutationTarget, ReadPolicy,
};
pub use pagination::{PageCheck, PageQuery, SortOrder, validate_collection, validate_page};
pub use report::{CaseReport, Outcome, RunReport};
