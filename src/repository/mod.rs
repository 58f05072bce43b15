//! Repository interface: the persistence seam the orchestrator is written
//! against. Shaped like a `WorkflowRunStore` / `RunState::can_transition_to`
//! pair plus `Arc<RwLock<HashMap<...>>>` in-memory bookkeeping, the kind
//! of thing a `FlowRunManager` does.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Edge, Run, Step, StepResult};
use crate::errors::EngineError;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_run(&self, run: Run) -> Result<Run, EngineError>;
    async fn get_run(&self, run_id: Uuid) -> Result<Run, EngineError>;
    async fn update_run(&self, run: &Run) -> Result<(), EngineError>;
    async fn list_steps_by_flow(&self, flow_id: Uuid) -> Result<Vec<Step>, EngineError>;
    async fn list_edges_by_flow(&self, flow_id: Uuid) -> Result<Vec<Edge>, EngineError>;
    async fn create_step_result(&self, result: &StepResult) -> Result<(), EngineError>;
    async fn update_step_result(&self, result: &StepResult) -> Result<(), EngineError>;
    async fn list_step_results_by_run(&self, run_id: Uuid) -> Result<Vec<StepResult>, EngineError>;
}

pub use memory::MemoryRepository;
