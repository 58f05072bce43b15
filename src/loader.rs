//! Flow file loading: read to string, parse JSON, surface a readable error.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{Edge, Flow, Step};

/// The on-disk shape of a flow: the flow header plus its steps and edges,
/// as authored by whatever tool produced the file (editor, fixture, etc).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub flow: Flow,
    pub steps: Vec<Step>,
    pub edges: Vec<Edge>,
}

pub fn load_flow_from_file(path: &Path) -> anyhow::Result<FlowDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading flow file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing flow file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_well_formed_flow_file() {
        let path = std::env::temp_dir().join(format!("flow-engine-test-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{
                "flow": {"id": "00000000-0000-0000-0000-000000000001", "name": "smoke", "created_at": "2026-01-01T00:00:00Z", "updated_at": "2026-01-01T00:00:00Z"},
                "steps": [],
                "edges": []
            }"#,
        )
        .unwrap();

        let def = load_flow_from_file(&path).unwrap();
        assert_eq!(def.flow.name, "smoke");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_produces_readable_error() {
        let path = std::env::temp_dir().join("flow-engine-test-does-not-exist.json");
        let err = load_flow_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("reading flow file"));
    }
}
