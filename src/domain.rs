use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-defined test flow: a named DAG of HTTP steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single HTTP step within a flow.
///
/// `headers` and `body` carry raw, pre-interpolation text. `capture` and
/// `assert` are newline-delimited directive blocks parsed at execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub flow_id: Uuid,
    pub name: String,
    pub method: String,
    pub url: String,
    /// JSON object of header name to value, serialized as text so it can hold
    /// interpolation tokens before being parsed.
    pub headers: String,
    pub body: Option<String>,
    #[serde(default)]
    pub capture: String,
    #[serde(default)]
    pub assert: String,
    pub sort_order: i32,
    #[serde(default)]
    pub editor_x: f64,
    #[serde(default)]
    pub editor_y: f64,
}

/// A directed edge expressing that `target_step_id` depends on `source_step_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: Uuid,
    pub flow_id: Uuid,
    pub source_step_id: Uuid,
    pub target_step_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Canceled,
}

impl RunStatus {
    /// Mirrors the run lifecycle: pending -> running -> one of {passed, failed, canceled}.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Running, Passed) | (Running, Failed) | (Running, Canceled)
        )
    }
}

/// One execution of a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub flow_id: Uuid,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Run {
    pub fn new(flow_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            flow_id,
            status: RunStatus::Pending,
            started_at: None,
            finished_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Passed,
    Failed,
}

/// The recorded outcome of executing one step within one run.
///
/// `request`/`response`/`assert_results`/`variables_captured` are opaque JSON
/// text snapshots — the engine never needs to query into them structurally,
/// only to persist and replay them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub id: Uuid,
    pub run_id: Uuid,
    pub step_id: Uuid,
    pub status: StepStatus,
    pub request: Option<String>,
    pub response: Option<String>,
    pub assert_results: Option<String>,
    pub variables_captured: Option<String>,
    pub duration_ms: u64,
    pub error_message: Option<String>,
}

/// A progress notification pushed onto the run's event channel: one before
/// a step starts (`status: running`, `data: None`) and one after it
/// finishes (`status: passed`/`failed`, `data` carrying the full StepResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEvent {
    pub run_id: Uuid,
    pub step_id: Uuid,
    pub step_name: String,
    pub status: StepStatus,
    pub data: Option<StepResult>,
}
