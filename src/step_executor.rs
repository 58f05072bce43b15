//! Step executor: the glue between the HTTP requester, the assertion
//! engine and the capture engine. `StepExecutor` is a trait seam even
//! though `HttpStepExecutor` is the only implementation — there is
//! exactly one step kind today, but the seam costs nothing to keep.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::assert::{self, AssertContext, AssertOutcome};
use crate::capture;
use crate::domain::{Step, StepResult, StepStatus};
use crate::errors::{ErrorCode, ErrorContext, StructuredError};
use crate::http_requester::HttpRequester;
use crate::interpolate::VariableStore;

fn serialize_or_log<T: Serialize>(value: &T, field: &str, step_id: Uuid) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::error!(
                code = %ErrorCode::SERIALIZATION_ERROR,
                field,
                step.id = %step_id,
                error = %err,
                "failed to serialize step result field"
            );
            None
        }
    }
}

fn failed_assertion_message(assertions: &[AssertOutcome]) -> String {
    assertions
        .iter()
        .filter(|a| !a.passed)
        .map(|a| match (&a.expected, &a.actual) {
            (Some(expected), Some(actual)) => format!("{} (expected {expected}, got {actual})", a.line),
            (Some(expected), None) => format!("{} (expected {expected})", a.line),
            _ => a.line.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, run_id: Uuid, step: &Step, store: &mut VariableStore) -> StepResult;
}

pub struct HttpStepExecutor {
    requester: HttpRequester,
}

impl HttpStepExecutor {
    pub fn new(requester: HttpRequester) -> Self {
        Self { requester }
    }
}

#[async_trait]
impl StepExecutor for HttpStepExecutor {
    #[tracing::instrument(skip(self, step, store), fields(step.id = %step.id, step.name = %step.name))]
    async fn execute(&self, run_id: Uuid, step: &Step, store: &mut VariableStore) -> StepResult {
        if serde_json::from_str::<std::collections::HashMap<String, String>>(&step.headers).is_err() {
            let err = StructuredError::new(ErrorCode::MALFORMED_HEADERS, "step headers are not a valid JSON object")
                .with_context(ErrorContext::default().with_step_id(step.id));
            return StepResult {
                id: Uuid::new_v4(),
                run_id,
                step_id: step.id,
                status: StepStatus::Failed,
                request: None,
                response: None,
                assert_results: None,
                variables_captured: None,
                duration_ms: 0,
                error_message: Some(err.user_message()),
            };
        }

        let outcome = self.requester.execute(step, store).await;
        let request_json = serialize_or_log(&outcome.request, "request", step.id);

        let Some(response) = &outcome.response else {
            return StepResult {
                id: Uuid::new_v4(),
                run_id,
                step_id: step.id,
                status: StepStatus::Failed,
                request: request_json,
                response: None,
                assert_results: None,
                variables_captured: None,
                duration_ms: outcome.duration_ms,
                error_message: outcome.transport_error,
            };
        };

        let response_json = serialize_or_log(response, "response", step.id);

        // Captures run unconditionally, before assertions are evaluated —
        // a step's later assertion failure must not suppress the variables
        // it already extracted.
        let captured = capture::apply_captures(&step.capture, Some(&response.body), store);
        let captured_json = serialize_or_log(&captured, "variables_captured", step.id);

        let assert_ctx = AssertContext {
            status: response.status,
            body: Some(&response.body),
            duration_ms: outcome.duration_ms,
        };
        let assertions = assert::evaluate(&step.assert, &assert_ctx);
        let all_passed = assertions.iter().all(|a| a.passed);
        let assert_json = serialize_or_log(&assertions, "assert_results", step.id);

        if !all_passed {
            return StepResult {
                id: Uuid::new_v4(),
                run_id,
                step_id: step.id,
                status: StepStatus::Failed,
                request: request_json,
                response: response_json,
                assert_results: assert_json,
                variables_captured: captured_json,
                duration_ms: outcome.duration_ms,
                error_message: Some(failed_assertion_message(&assertions)),
            };
        }

        StepResult {
            id: Uuid::new_v4(),
            run_id,
            step_id: step.id,
            status: StepStatus::Passed,
            request: request_json,
            response: response_json,
            assert_results: assert_json,
            variables_captured: captured_json,
            duration_ms: outcome.duration_ms,
            error_message: None,
        }
    }
}
