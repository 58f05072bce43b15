//! Run orchestrator: drives a run's steps strictly sequentially,
//! fail-fast, and pushes progress onto a single-producer event channel
//! that's closed exactly once. No retry machinery — a step either
//! passes or fails outright. `RunService::start_run` spawns the run as
//! a background task via `tokio::spawn`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::domain::{Run, RunStatus, Step, StepEvent, StepResult, StepStatus};
use crate::errors::{EngineError, ErrorCode};
use crate::interpolate::VariableStore;
use crate::repository::Repository;
use crate::step_executor::StepExecutor;
use crate::toposort;
use crate::validation;

/// Owns the event channel's sending half for the duration of a run. Its
/// `Drop` impl always runs — on early return, on error, even on panic
/// unwind — so the channel closes exactly once regardless of how the run
/// ends. The SSE adapter treats the channel closing as the run's "done"
/// signal.
struct EventChannelGuard {
    sender: Option<mpsc::Sender<StepEvent>>,
}

impl EventChannelGuard {
    fn new(sender: mpsc::Sender<StepEvent>) -> Self {
        Self { sender: Some(sender) }
    }

    async fn send(&self, event: StepEvent) {
        if let Some(sender) = &self.sender {
            if sender.send(event).await.is_err() {
                tracing::debug!(code = %ErrorCode::CHANNEL_CLOSED, "event receiver dropped, run continues unobserved");
            }
        }
    }
}

pub struct RunOrchestrator<R: Repository> {
    repo: Arc<R>,
    step_executor: Arc<dyn StepExecutor>,
}

impl<R: Repository> RunOrchestrator<R> {
    pub fn new(repo: Arc<R>, step_executor: Arc<dyn StepExecutor>) -> Self {
        Self { repo, step_executor }
    }

    /// Executes every step of `flow_id` for `run_id` in topological order,
    /// stopping at the first failure (fail-fast). Steps never reached keep
    /// the `pending` StepResult row `RunService::start_run` pre-created for
    /// them — this is intentional and visible to consumers, not an error.
    #[tracing::instrument(skip(self, events, cancel), fields(run.id = %run_id, flow.id = %flow_id))]
    pub async fn run(
        &self,
        flow_id: Uuid,
        run_id: Uuid,
        events: mpsc::Sender<StepEvent>,
        cancel: watch::Receiver<bool>,
    ) -> Result<(), EngineError> {
        let guard = EventChannelGuard::new(events);

        let steps = self.repo.list_steps_by_flow(flow_id).await?;
        validation::validate_flow(&steps)?;
        let edges = self.repo.list_edges_by_flow(flow_id).await?;
        let order = toposort::topological_order(&steps, &edges);
        let steps_by_id: HashMap<Uuid, &Step> = steps.iter().map(|s| (s.id, s)).collect();

        let mut run = self.repo.get_run(run_id).await?;
        run.status = RunStatus::Running;
        run.started_at = Some(Utc::now());
        self.repo.update_run(&run).await?;

        let existing_results = self.repo.list_step_results_by_run(run_id).await?;
        let placeholder_ids: HashMap<Uuid, Uuid> =
            existing_results.iter().map(|r| (r.step_id, r.id)).collect();

        let mut store = VariableStore::new();
        let mut failed = false;
        let mut canceled = false;

        for step_id in &order {
            // Cancellation is only ever observed at a step boundary, never
            // mid-HTTP-call: a request already in flight always finishes.
            if *cancel.borrow() {
                canceled = true;
                break;
            }

            let Some(step) = steps_by_id.get(step_id) else {
                continue;
            };

            guard
                .send(StepEvent {
                    run_id,
                    step_id: step.id,
                    step_name: step.name.clone(),
                    status: StepStatus::Running,
                    data: None,
                })
                .await;

            let mut result = self.step_executor.execute(run_id, step, &mut store).await;
            if let Some(placeholder_id) = placeholder_ids.get(&step.id) {
                result.id = *placeholder_id;
            }
            self.repo.update_step_result(&result).await?;

            guard
                .send(StepEvent {
                    run_id,
                    step_id: step.id,
                    step_name: step.name.clone(),
                    status: result.status,
                    data: Some(result.clone()),
                })
                .await;

            if result.status == StepStatus::Failed {
                failed = true;
                break;
            }
        }

        run.status = if canceled {
            RunStatus::Canceled
        } else if failed {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };
        run.finished_at = Some(Utc::now());
        self.repo.update_run(&run).await?;

        Ok(())
    }
}

/// Lets a caller request cancellation of a started run. Dropping it has no
/// effect — cancellation only happens on an explicit `cancel()` call, so a
/// client that simply disconnects never cancels the run underneath it (S6).
#[derive(Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Creates a run row and hands back a receiver for its progress events
/// immediately, running the orchestrator to completion in the background.
/// Grounded in `FlowRunManager::start`'s `tokio::spawn` + record-update
/// shape.
pub struct RunService<R: Repository> {
    repo: Arc<R>,
    orchestrator: Arc<RunOrchestrator<R>>,
}

impl<R: Repository + 'static> RunService<R> {
    pub fn new(repo: Arc<R>, step_executor: Arc<dyn StepExecutor>) -> Self {
        let orchestrator = Arc::new(RunOrchestrator::new(repo.clone(), step_executor));
        Self { repo, orchestrator }
    }

    pub async fn start_run(
        &self,
        flow_id: Uuid,
    ) -> Result<(Run, mpsc::Receiver<StepEvent>, CancelHandle), EngineError> {
        let run = self.repo.create_run(Run::new(flow_id)).await?;

        let steps = self.repo.list_steps_by_flow(flow_id).await?;
        for step in &steps {
            let placeholder = StepResult {
                id: Uuid::new_v4(),
                run_id: run.id,
                step_id: step.id,
                status: StepStatus::Pending,
                request: None,
                response: None,
                assert_results: None,
                variables_captured: None,
                duration_ms: 0,
                error_message: None,
            };
            self.repo.create_step_result(&placeholder).await?;
        }

        let (tx, rx) = mpsc::channel(32);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let orchestrator = self.orchestrator.clone();
        let run_id = run.id;

        tokio::spawn(async move {
            if let Err(err) = orchestrator.run(flow_id, run_id, tx, cancel_rx).await {
                tracing::error!(error = %err, "run orchestration failed before completion");
            }
        });

        Ok((run, rx, CancelHandle { tx: cancel_tx }))
    }

    pub fn repo(&self) -> &Arc<R> {
        &self.repo
    }
}
