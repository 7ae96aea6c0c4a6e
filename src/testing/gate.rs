//! Wall-clock latency budget around a single call.

use std::future::Future;
use std::time::Instant;

use tracing::warn;

use crate::error::Result;
use crate::http::CallResult;
use crate::schema::{Failure, FailureKind, ValidationResult};

/// A response together with its latency verdict.
///
/// The response is always kept, so a slow but correct answer can still be
/// checked for conformance and reported separately.
#[derive(Debug, Clone)]
pub struct Gated {
    pub response: CallResult,
    pub elapsed_ms: u64,
    pub budget_ms: u64,
    pub outcome: ValidationResult,
}

impl Gated {
    pub fn within_budget(&self) -> bool {
        !self.outcome.has(FailureKind::PerformanceBudgetExceeded)
    }
}

pub fn budget_failure(budget_ms: u64, elapsed_ms: u64) -> Option<Failure> {
    (elapsed_ms > budget_ms).then(|| {
        Failure::new(
            FailureKind::PerformanceBudgetExceeded,
            "elapsedMs",
            format!("<= {budget_ms} ms"),
            format!("{elapsed_ms} ms"),
        )
    })
}

/// Await `call`, failing the outcome if it took longer than `budget_ms`.
///
/// Transport errors pass through untouched.
pub async fn with_budget<F>(budget_ms: u64, call: F) -> Result<Gated>
where
    F: Future<Output = Result<CallResult>>,
{
    let started = Instant::now();
    let response = call.await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let outcome = match budget_failure(budget_ms, elapsed_ms) {
        Some(failure) => {
            warn!(budget_ms, elapsed_ms, status = response.status, "performance budget exceeded");
            ValidationResult::pass().with_failure(failure)
        }
        None => ValidationResult::pass(),
    };

    Ok(Gated {
        response,
        elapsed_ms,
        budget_ms,
        outcome,
    })
}
