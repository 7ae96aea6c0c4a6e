use std::fmt::{self, Display};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::HarnessError;
use crate::schema::{Failure, FailureKind, ValidationResult};

/// What a test-runner sees for one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail(ValidationResult),
    /// The target was unreachable; not a contract verdict.
    Skip(String),
}

impl Outcome {
    pub fn from_validation(result: ValidationResult) -> Self {
        if result.passed() {
            Outcome::Pass
        } else {
            Outcome::Fail(result)
        }
    }

    /// Fold a call error into an outcome: unreachable targets skip, every
    /// other error is a failure of the case.
    pub fn from_error(err: &HarnessError) -> Self {
        if err.is_environment_failure() {
            warn!(error = %err, "target unreachable, skipping");
            return Outcome::Skip(err.to_string());
        }
        Outcome::Fail(ValidationResult::pass().with_failure(error_failure(err)))
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skip(_))
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            Outcome::Fail(result) => Some(result),
            _ => None,
        }
    }

    /// Panic with every collected failure unless the case passed or skipped.
    #[track_caller]
    pub fn assert_conformant(&self, name: &str) {
        match self {
            Outcome::Pass => {}
            Outcome::Skip(reason) => warn!(case = name, %reason, "case skipped"),
            Outcome::Fail(result) => panic!("{name}: {result}"),
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "PASS"),
            Outcome::Fail(result) => write!(f, "FAIL ({} failure(s))", result.failures().len()),
            Outcome::Skip(reason) => write!(f, "SKIP ({reason})"),
        }
    }
}

pub fn error_failure(err: &HarnessError) -> Failure {
    let reason = if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::TransportError
    };
    Failure::new(reason, "request", "a response", err.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

/// Summary report for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, case: CaseReport) {
        self.total += 1;
        match case.outcome {
            Outcome::Pass => self.passed += 1,
            Outcome::Fail(_) => self.failed += 1,
            Outcome::Skip(_) => self.skipped += 1,
        }
        self.duration_ms += case.duration_ms;
        self.cases.push(case);
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// `0` when nothing failed. Skips do not fail a run.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|case| case.outcome.is_fail())
    }

    pub fn log_summary(&self) {
        info!(
            total = self.total,
            passed = self.passed,
            failed = self.failed,
            skipped = self.skipped,
            duration_ms = self.duration_ms,
            "run finished"
        );
    }

    #[track_caller]
    pub fn assert_all_passed(&self) {
        if self.all_passed() {
            return;
        }
        let mut message = format!("{} of {} case(s) failed\n", self.failed, self.total);
        for case in self.failures() {
            message.push_str(&format!("{}: {}\n", case.name, case.outcome));
            if let Some(result) = case.outcome.validation() {
                message.push_str(&result.to_string());
            }
        }
        panic!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportKind;
    use crate::http::HttpMethod;

    fn case(name: &str, outcome: Outcome) -> CaseReport {
        CaseReport {
            name: name.to_string(),
            outcome,
            duration_ms: 5,
        }
    }

    fn failing() -> ValidationResult {
        let failure = Failure::new(FailureKind::UnexpectedStatus, "status", "200", "500");
        ValidationResult::pass().with_failure(failure)
    }

    #[test]
    fn record_counts_each_outcome() {
        let mut report = RunReport::new();
        report.record(case("a", Outcome::Pass));
        report.record(case("b", Outcome::Fail(failing())));
        report.record(case("c", Outcome::Skip("offline".into())));

        assert_eq!((report.total, report.passed, report.failed, report.skipped), (3, 1, 1, 1));
        assert_eq!(report.duration_ms, 15);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failures().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn skips_alone_do_not_fail_the_run() {
        let mut report = RunReport::new();
        report.record(case("a", Outcome::Skip("offline".into())));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn connection_refused_skips_but_timeout_fails() {
        let refused = HarnessError::Transport {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:9/posts".into(),
            kind: TransportKind::Connect,
            message: "connection refused".into(),
        };
        assert!(Outcome::from_error(&refused).is_skip());

        let timeout = HarnessError::Timeout {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:9/posts".into(),
            timeout_ms: 10,
        };
        let outcome = Outcome::from_error(&timeout);
        assert!(outcome.validation().unwrap().has(FailureKind::Timeout));
    }

    #[test]
    #[should_panic(expected = "post 1")]
    fn assert_conformant_panics_on_failure() {
        Outcome::Fail(failing()).assert_conformant("post 1");
    }
}
