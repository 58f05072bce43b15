use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Edge, Run, Step, StepResult};
use crate::errors::EngineError;

use super::Repository;

/// In-memory Repository, primarily for the CLI and tests. Mirrors the
/// `Arc<RwLock<HashMap<String, FlowRunRecord>>>` bookkeeping shape a
/// `FlowRunManager` would use.
#[derive(Default)]
pub struct MemoryRepository {
    steps: RwLock<HashMap<Uuid, Vec<Step>>>,
    edges: RwLock<HashMap<Uuid, Vec<Edge>>>,
    runs: RwLock<HashMap<Uuid, Run>>,
    step_results: RwLock<HashMap<Uuid, Vec<StepResult>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub async fn seed_flow(&self, flow_id: Uuid, steps: Vec<Step>, edges: Vec<Edge>) {
        self.steps.write().await.insert(flow_id, steps);
        self.edges.write().await.insert(flow_id, edges);
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_run(&self, run: Run) -> Result<Run, EngineError> {
        self.runs.write().await.insert(run.id, run.clone());
        Ok(run)
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Run, EngineError> {
        self.runs
            .read()
            .await
            .get(&run_id)
            .cloned()
            .ok_or(EngineError::RunNotFound(run_id))
    }

    async fn update_run(&self, run: &Run) -> Result<(), EngineError> {
        let mut guard = self.runs.write().await;
        if let Some(existing) = guard.get(&run.id) {
            if existing.status != run.status && !existing.status.can_transition_to(run.status) {
                return Err(EngineError::InvalidTransition {
                    from: existing.status,
                    to: run.status,
                });
            }
        }
        guard.insert(run.id, run.clone());
        Ok(())
    }

    async fn list_steps_by_flow(&self, flow_id: Uuid) -> Result<Vec<Step>, EngineError> {
        Ok(self.steps.read().await.get(&flow_id).cloned().unwrap_or_default())
    }

    async fn list_edges_by_flow(&self, flow_id: Uuid) -> Result<Vec<Edge>, EngineError> {
        Ok(self.edges.read().await.get(&flow_id).cloned().unwrap_or_default())
    }

    async fn create_step_result(&self, result: &StepResult) -> Result<(), EngineError> {
        self.step_results
            .write()
            .await
            .entry(result.run_id)
            .or_default()
            .push(result.clone());
        Ok(())
    }

    async fn update_step_result(&self, result: &StepResult) -> Result<(), EngineError> {
        let mut guard = self.step_results.write().await;
        let results = guard.entry(result.run_id).or_default();
        if let Some(existing) = results.iter_mut().find(|r| r.id == result.id) {
            *existing = result.clone();
        } else {
            results.push(result.clone());
        }
        Ok(())
    }

    async fn list_step_results_by_run(&self, run_id: Uuid) -> Result<Vec<StepResult>, EngineError> {
        Ok(self.step_results.read().await.get(&run_id).cloned().unwrap_or_default())
    }
}
