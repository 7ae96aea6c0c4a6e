//! # Resource lifecycle
//!
//! Drives `Created -> Read -> Updated -> Deleted -> Verified` for one fresh
//! resource per sequence.
//!
//! The target backend echoes writes without persisting them. Consequences
//! the tracker is built around:
//! - the id returned by a create is only meaningful for that response;
//! - a read after a create is never asserted to return the created body;
//! - update and delete responses are judged on their own, never by re-reading;
//! - a successful delete is not taken as proof of deletion.
//!
//! Every step runs even when an earlier one failed, so independent failures
//! are all reported.

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::cases::{check_echo, check_schema, check_status};
use super::gate::with_budget;
use super::report::Outcome;
use crate::config::DEFAULT_BUDGET_MS;
use crate::http::{CallResult, HttpMethod, RequestInput, Session};
use crate::resources::ResourceKind;
use crate::schema::{Failure, FailureKind, Schema, ValidationResult, join_path};

static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Created,
    Read,
    Updated,
    Deleted,
    Verified,
}

impl LifecycleState {
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        matches!(
            (self, next),
            (LifecycleState::Created, LifecycleState::Read | LifecycleState::Updated)
                | (LifecycleState::Read, LifecycleState::Updated)
                | (LifecycleState::Updated, LifecycleState::Deleted)
                | (LifecycleState::Deleted, LifecycleState::Verified)
        )
    }

    fn label(self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Read => "read",
            LifecycleState::Updated => "updated",
            LifecycleState::Deleted => "deleted",
            LifecycleState::Verified => "verified",
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How far a returned id can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Valid for the response that produced it only.
    EchoOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteId {
    pub value: Value,
    pub persistence: Persistence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedResource {
    pub local_id: u64,
    pub remote_id: Option<RemoteId>,
    pub last_known_state: Option<Value>,
}

impl TrackedResource {
    fn fresh() -> Self {
        Self {
            local_id: NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed),
            remote_id: None,
            last_known_state: None,
        }
    }
}

/// Whether to issue a GET after the create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    #[default]
    Skip,
    /// Issue the read and record what came back without asserting on it.
    Probe,
}

/// Which id the update and delete steps address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    /// The id returned by the create step.
    RemoteId,
    /// A seeded id known to exist, for backends that never store the created one.
    Fixture(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecyclePlan {
    pub kind: ResourceKind,
    pub create_body: Value,
    pub create_schema: &'static Schema,
    pub read: ReadPolicy,
    pub update_method: HttpMethod,
    pub update_body: Value,
    pub target: MutationTarget,
    pub delete_statuses: Vec<u16>,
    pub budget_ms: u64,
}

impl LifecyclePlan {
    pub fn new(kind: ResourceKind, create_body: Value, update_body: Value) -> Self {
        Self {
            kind,
            create_body,
            create_schema: kind.schema(),
            read: ReadPolicy::Skip,
            update_method: HttpMethod::Put,
            update_body,
            // Shared by every plan unless overridden; concurrent plans need distinct fixtures.
            target: MutationTarget::Fixture(1),
            delete_statuses: vec![200, 204],
            budget_ms: DEFAULT_BUDGET_MS,
        }
    }

    pub fn read(mut self, policy: ReadPolicy) -> Self {
        self.read = policy;
        self
    }

    pub fn patch(mut self) -> Self {
        self.update_method = HttpMethod::Patch;
        self
    }

    pub fn target(mut self, target: MutationTarget) -> Self {
        self.target = target;
        self
    }

    pub fn create_schema(mut self, schema: &'static Schema) -> Self {
        self.create_schema = schema;
        self
    }

    pub fn budget(mut self, budget_ms: u64) -> Self {
        self.budget_ms = budget_ms;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub state: LifecycleState,
    pub request: String,
    pub observed_status: Option<u16>,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleReport {
    pub resource: TrackedResource,
    pub steps: Vec<StepReport>,
    pub final_state: LifecycleState,
}

impl LifecycleReport {
    pub fn step(&self, state: LifecycleState) -> Option<&StepReport> {
        self.steps.iter().find(|step| step.state == state)
    }

    /// Combined verdict. Failure fields are prefixed with the step label.
    pub fn outcome(&self) -> Outcome {
        let mut failures = Vec::new();
        for step in &self.steps {
            if let Outcome::Fail(result) = &step.outcome {
                failures.extend(result.failures().iter().map(|failure| Failure {
                    field: join_path(step.state.label(), &failure.field),
                    ..failure.clone()
                }));
            }
        }
        if !failures.is_empty() {
            return Outcome::Fail(ValidationResult::from_failures(failures));
        }
        match self.steps.iter().find_map(|step| match &step.outcome {
            Outcome::Skip(reason) => Some(reason.clone()),
            _ => None,
        }) {
            Some(reason) => Outcome::Skip(reason),
            None => Outcome::Pass,
        }
    }
}

pub struct LifecycleTracker<'s> {
    session: &'s Session,
}

impl<'s> LifecycleTracker<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    pub async fn run(&self, plan: &LifecyclePlan) -> LifecycleReport {
        let descriptor = plan.kind.descriptor();
        let mut resource = TrackedResource::fresh();
        let mut steps = Vec::with_capacity(4);
        let mut state = LifecycleState::Created;

        // Created
        let expected = as_map(&plan.create_body);
        let request = RequestInput::new(HttpMethod::Post, descriptor.base_path)
            .with_body(plan.create_body.clone());
        let (step, response) = self
            .step(LifecycleState::Created, request, plan.budget_ms, |response| {
                let mut result = ValidationResult::pass();
                if let Some(failure) = check_status(&[201], response.status) {
                    result = result.with_failure(failure);
                }
                let echo = check_echo(&expected, &response.body);
                result
                    .and(check_schema(plan.create_schema, response))
                    .and(ValidationResult::from_failures(echo))
            })
            .await;
        steps.push(step);
        if let Some(response) = response {
            resource.remote_id = response
                .body
                .get(descriptor.id_field)
                .cloned()
                .map(|value| RemoteId {
                    value,
                    persistence: Persistence::EchoOnly,
                });
            resource.last_known_state = Some(response.body);
        }

        // Read
        if plan.read == ReadPolicy::Probe {
            let step = match &resource.remote_id {
                Some(remote) => {
                    let path = descriptor.item_path(&render_id(&remote.value));
                    let request = RequestInput::new(HttpMethod::Get, path);
                    let (step, _) = self
                        .step(LifecycleState::Read, request, plan.budget_ms, |response| {
                            debug!(
                                status = response.status,
                                "post-create read observed; not asserted against the created body"
                            );
                            ValidationResult::pass()
                        })
                        .await;
                    // Only reachability counts here; latency and content are informational.
                    StepReport {
                        outcome: match step.outcome {
                            Outcome::Skip(reason) => Outcome::Skip(reason),
                            _ => Outcome::Pass,
                        },
                        ..step
                    }
                }
                None => skipped_step(LifecycleState::Read, "create returned no id to read"),
            };
            steps.push(step);
            state = advance(state, LifecycleState::Read);
        }

        // Updated
        let update_path = self.mutation_path(plan, &resource);
        let expected = as_map(&plan.update_body);
        let step = match update_path {
            Ok(path) => {
                let request =
                    RequestInput::new(plan.update_method, path).with_body(plan.update_body.clone());
                let (step, response) = self
                    .step(LifecycleState::Updated, request, plan.budget_ms, |response| {
                        let status = check_status(&[200], response.status);
                        let echo = check_echo(&expected, &response.body);
                        ValidationResult::from_failures(status.into_iter().collect())
                            .and(ValidationResult::from_failures(echo))
                    })
                    .await;
                if let Some(response) = response {
                    resource.last_known_state = Some(response.body);
                }
                step
            }
            Err(failure) => failed_step(LifecycleState::Updated, failure),
        };
        steps.push(step);
        state = advance(state, LifecycleState::Updated);

        // Deleted
        let step = match self.mutation_path(plan, &resource) {
            Ok(path) => {
                let request = RequestInput::new(HttpMethod::Delete, path);
                let (step, _) = self
                    .step(LifecycleState::Deleted, request, plan.budget_ms, |response| {
                        let status = check_status(&plan.delete_statuses, response.status);
                        ValidationResult::from_failures(status.into_iter().collect())
                    })
                    .await;
                step
            }
            Err(failure) => failed_step(LifecycleState::Deleted, failure),
        };
        steps.push(step);
        state = advance(state, LifecycleState::Deleted);

        // Verified: nothing is re-read, the resource is simply discarded.
        resource.last_known_state = None;
        state = advance(state, LifecycleState::Verified);

        let report = LifecycleReport {
            resource,
            steps,
            final_state: state,
        };
        info!(
            kind = %plan.kind,
            local_id = report.resource.local_id,
            outcome = %report.outcome(),
            "lifecycle sequence verified"
        );
        report
    }

    fn mutation_path(
        &self,
        plan: &LifecyclePlan,
        resource: &TrackedResource,
    ) -> Result<String, Failure> {
        let descriptor = plan.kind.descriptor();
        match plan.target {
            MutationTarget::Fixture(id) => Ok(descriptor.item_path(&id.to_string())),
            MutationTarget::RemoteId => resource
                .remote_id
                .as_ref()
                .map(|remote| descriptor.item_path(&render_id(&remote.value)))
                .ok_or_else(|| {
                    Failure::new(
                        FailureKind::MissingField,
                        descriptor.id_field,
                        "id returned by create",
                        "absent",
                    )
                }),
        }
    }

    async fn step<F>(
        &self,
        state: LifecycleState,
        request: RequestInput,
        budget_ms: u64,
        check: F,
    ) -> (StepReport, Option<CallResult>)
    where
        F: FnOnce(&CallResult) -> ValidationResult,
    {
        let started = Instant::now();
        let call = self.session.send(&request);
        let (outcome, observed_status, response) = match with_budget(budget_ms, call).await {
            Ok(gated) => {
                let result = check(&gated.response).and(gated.outcome);
                let status = gated.response.status;
                (Outcome::from_validation(result), Some(status), Some(gated.response))
            }
            Err(err) => (Outcome::from_error(&err), None, None),
        };

        let report = StepReport {
            state,
            request: format!("{} {}", request.method, request.path),
            observed_status,
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        (report, response)
    }
}

fn advance(from: LifecycleState, to: LifecycleState) -> LifecycleState {
    debug_assert!(from.can_advance_to(to), "illegal lifecycle transition {from} -> {to}");
    to
}

fn as_map(body: &Value) -> Map<String, Value> {
    body.as_object().cloned().unwrap_or_default()
}

fn render_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn skipped_step(state: LifecycleState, reason: &str) -> StepReport {
    debug!(%state, reason, "lifecycle step not issued");
    StepReport {
        state,
        request: String::new(),
        observed_status: None,
        outcome: Outcome::Pass,
        duration_ms: 0,
    }
}

fn failed_step(state: LifecycleState, failure: Failure) -> StepReport {
    StepReport {
        state,
        request: String::new(),
        observed_status: None,
        outcome: Outcome::Fail(ValidationResult::pass().with_failure(failure)),
        duration_ms: 0,
    }
}
