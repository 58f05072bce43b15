//! Pre-flight flow validation, narrowed to the one condition that's
//! actually a Setup error for this engine: a flow with no steps can't
//! produce a run. Dangling edges and cycles are *not* validation
//! failures — the topological sorter has an explicit fallback for both.

use crate::domain::Step;
use crate::errors::EngineError;

pub fn validate_flow(steps: &[Step]) -> Result<(), EngineError> {
    if steps.is_empty() {
        return Err(EngineError::EmptyFlow);
    }
    Ok(())
}
