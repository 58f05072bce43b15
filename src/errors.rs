//! Structured error codes, scoped to this engine's four categories: Setup,
//! Definition, Transport, Internal. Setup/Internal errors abort a run before
//! or outside step execution; Definition/Transport errors are recorded on a
//! `StepResult` and drive fail-fast, they never unwind the orchestrator.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // Setup: 1xxx — the run or flow cannot begin.
    pub const EMPTY_FLOW: ErrorCode = ErrorCode(1002);
    pub const RUN_NOT_FOUND: ErrorCode = ErrorCode(1003);
    pub const INVALID_RUN_TRANSITION: ErrorCode = ErrorCode(1004);

    // Definition: 4xxx — malformed per-step data, fails that step only.
    pub const MALFORMED_HEADERS: ErrorCode = ErrorCode(4001);
    pub const INVALID_ASSERTION_LINE: ErrorCode = ErrorCode(4002);

    // Transport: 3xxx — the HTTP call itself could not complete.
    pub const HTTP_TIMEOUT: ErrorCode = ErrorCode(3001);
    pub const HTTP_CONNECTION_ERROR: ErrorCode = ErrorCode(3002);

    // Internal: 5xxx — serialization/channel failures.
    pub const SERIALIZATION_ERROR: ErrorCode = ErrorCode(5001);
    pub const CHANNEL_CLOSED: ErrorCode = ErrorCode(5002);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            1000..=1999 => ErrorCategory::Setup,
            3000..=3999 => ErrorCategory::Transport,
            4000..=4999 => ErrorCategory::Definition,
            _ => ErrorCategory::Internal,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::EMPTY_FLOW => "flow has no steps",
            Self::RUN_NOT_FOUND => "run not found",
            Self::INVALID_RUN_TRANSITION => "invalid run state transition",
            Self::MALFORMED_HEADERS => "step headers are not a valid JSON object",
            Self::INVALID_ASSERTION_LINE => "unrecognized assertion line",
            Self::HTTP_TIMEOUT => "request timed out",
            Self::HTTP_CONNECTION_ERROR => "request could not be sent",
            Self::SERIALIZATION_ERROR => "failed to serialize a result",
            Self::CHANNEL_CLOSED => "event channel closed unexpectedly",
            _ => "unknown error",
        }
    }

    pub fn formatted(self) -> String {
        format!("E{}: {}", self.0, self.description())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Setup,
    Definition,
    Transport,
    Internal,
}

/// Extra context attached to a StructuredError, filled in as it's available.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub step_id: Option<uuid::Uuid>,
    pub path: Option<String>,
}

impl ErrorContext {
    pub fn with_step_id(mut self, step_id: uuid::Uuid) -> Self {
        self.step_id = Some(step_id);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct StructuredError {
    pub code: ErrorCode,
    pub message: String,
    pub context: ErrorContext,
}

impl StructuredError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    pub fn user_message(&self) -> String {
        format!("{} ({})", self.message, self.code.formatted())
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for StructuredError {}

/// Crate-level errors that can abort a run before step execution starts.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("run {0} not found ({})", ErrorCode::RUN_NOT_FOUND.formatted())]
    RunNotFound(uuid::Uuid),
    #[error("flow has no steps ({})", ErrorCode::EMPTY_FLOW.formatted())]
    EmptyFlow,
    #[error("invalid run transition from {from:?} to {to:?} ({})", ErrorCode::INVALID_RUN_TRANSITION.formatted())]
    InvalidTransition {
        from: crate::domain::RunStatus,
        to: crate::domain::RunStatus,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
