//! Kahn's-algorithm topological sort over a flow's steps and edges. No
//! parallel dispatch here — the orchestrator walks the resulting order
//! strictly sequentially.

use std::collections::{BTreeSet, HashMap, HashSet};

use uuid::Uuid;

use crate::domain::{Edge, Step};

/// Produces an execution order over `steps` honoring every edge in `edges`.
/// Ties among ready nodes break on `sort_order` then `id`. If the graph
/// contains a cycle or edges reference unknown steps, every node that Kahn's
/// algorithm could not reach is appended afterward in `sort_order` order —
/// the run still executes, it just can't honor the broken dependency.
pub fn topological_order(steps: &[Step], edges: &[Edge]) -> Vec<Uuid> {
    let mut indegree: HashMap<Uuid, i32> = steps.iter().map(|s| (s.id, 0)).collect();
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

    for edge in edges {
        if indegree.contains_key(&edge.source_step_id) && indegree.contains_key(&edge.target_step_id) {
            *indegree.get_mut(&edge.target_step_id).unwrap() += 1;
            adjacency.entry(edge.source_step_id).or_default().push(edge.target_step_id);
        }
    }

    let sort_order_of: HashMap<Uuid, i32> = steps.iter().map(|s| (s.id, s.sort_order)).collect();
    let mut remaining = indegree.clone();

    let mut ready: BTreeSet<(i32, Uuid)> = indegree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| (sort_order_of[id], *id))
        .collect();

    let mut order = Vec::with_capacity(steps.len());

    while let Some(&(so, id)) = ready.iter().next() {
        ready.remove(&(so, id));
        order.push(id);
        if let Some(targets) = adjacency.get(&id) {
            for &target in targets {
                let deg = remaining.get_mut(&target).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    ready.insert((sort_order_of[&target], target));
                }
            }
        }
    }

    if order.len() < steps.len() {
        let emitted: HashSet<Uuid> = order.iter().copied().collect();
        let mut fallback: Vec<&Step> = steps.iter().filter(|s| !emitted.contains(&s.id)).collect();
        fallback.sort_by_key(|s| (s.sort_order, s.id));
        order.extend(fallback.iter().map(|s| s.id));
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: Uuid, sort_order: i32) -> Step {
        Step {
            id,
            flow_id: Uuid::nil(),
            name: format!("step-{sort_order}"),
            method: "GET".into(),
            url: "/".into(),
            headers: "{}".into(),
            body: None,
            capture: String::new(),
            assert: String::new(),
            sort_order,
            editor_x: 0.0,
            editor_y: 0.0,
        }
    }

    fn edge(source: Uuid, target: Uuid) -> Edge {
        Edge {
            id: Uuid::new_v4(),
            flow_id: Uuid::nil(),
            source_step_id: source,
            target_step_id: target,
        }
    }

    #[test]
    fn linear_chain_preserves_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let steps = vec![step(a, 0), step(b, 1), step(c, 2)];
        let edges = vec![edge(a, b), edge(b, c)];
        assert_eq!(topological_order(&steps, &edges), vec![a, b, c]);
    }

    #[test]
    fn independent_roots_ordered_by_sort_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let steps = vec![step(b, 1), step(a, 0)];
        assert_eq!(topological_order(&steps, &[]), vec![a, b]);
    }

    #[test]
    fn join_waits_for_all_dependencies() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let steps = vec![step(a, 0), step(b, 1), step(c, 2)];
        // both a and b must run before c
        let edges = vec![edge(a, c), edge(b, c)];
        let order = topological_order(&steps, &edges);
        assert_eq!(order.last(), Some(&c));
    }

    #[test]
    fn cycle_falls_back_to_sort_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let steps = vec![step(a, 0), step(b, 1)];
        let edges = vec![edge(a, b), edge(b, a)];
        assert_eq!(topological_order(&steps, &edges), vec![a, b]);
    }

    #[test]
    fn dangling_edge_is_ignored() {
        let a = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let steps = vec![step(a, 0)];
        let edges = vec![edge(ghost, a)];
        assert_eq!(topological_order(&steps, &edges), vec![a]);
    }
}
