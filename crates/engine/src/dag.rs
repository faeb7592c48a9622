//! Graph validation — run before any executor is invoked.
//!
//! Rules enforced:
//! 1. Node ids are non-empty and unique within the workflow.
//! 2. Every edge references existing nodes on both sides.
//! 3. The directed graph is acyclic (topological sort must succeed).
//!
//! Returns node ids in execution order. The order is stable for a given
//! workflow: ready nodes are taken in declaration order, successors in edge
//! order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{EngineError, Workflow};

/// Validate the workflow and return a topological execution order.
///
/// # Errors
/// - [`EngineError::EmptyNodeId`] / [`EngineError::DuplicateNodeId`] for
///   malformed nodes.
/// - [`EngineError::UnknownNodeReference`] for dangling edges.
/// - [`EngineError::CycleDetected`] if the graph is not acyclic.
pub fn validate_dag(workflow: &Workflow) -> Result<Vec<String>, EngineError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &workflow.nodes {
        if node.id.is_empty() {
            return Err(EngineError::EmptyNodeId);
        }
        if !seen.insert(node.id.as_str()) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
    }

    for edge in &workflow.edges {
        for endpoint in [edge.source.as_str(), edge.target.as_str()] {
            if !seen.contains(endpoint) {
                return Err(EngineError::UnknownNodeReference { node_id: endpoint.to_owned() });
            }
        }
    }

    // Kahn's algorithm over adjacency + in-degree maps.
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in &workflow.nodes {
        adjacency.entry(node.id.as_str()).or_default();
        in_degree.entry(node.id.as_str()).or_insert(0);
    }
    for edge in &workflow.edges {
        adjacency.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    // Seed in declaration order so the sort is stable across runs.
    let mut queue: VecDeque<&str> = workflow
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut sorted: Vec<String> = Vec::with_capacity(workflow.nodes.len());
    while let Some(node_id) = queue.pop_front() {
        sorted.push(node_id.to_owned());
        if let Some(successors) = adjacency.get(node_id) {
            for &successor in successors {
                let degree = in_degree.get_mut(successor).expect("endpoint validated");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(successor);
                }
            }
        }
    }

    if sorted.len() != workflow.nodes.len() {
        return Err(EngineError::CycleDetected);
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, Node};
    use serde_json::Value;

    fn node(id: &str) -> Node {
        Node { id: id.into(), kind: "gpt".into(), config: Value::Null, position: None }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge { id: None, source: source.into(), target: target.into() }
    }

    #[test]
    fn linear_graph_sorts_in_order() {
        let workflow = Workflow::new(
            vec![node("a"), node("b"), node("c")],
            vec![edge("a", "b"), edge("b", "c")],
        );
        assert_eq!(validate_dag(&workflow).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_respects_dependencies() {
        let workflow = Workflow::new(
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
        );
        let sorted = validate_dag(&workflow).unwrap();
        assert_eq!(sorted.first().unwrap(), "a");
        assert_eq!(sorted.last().unwrap(), "d");
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn two_node_cycle_is_rejected() {
        let workflow =
            Workflow::new(vec![node("a"), node("b")], vec![edge("a", "b"), edge("b", "a")]);
        let err = validate_dag(&workflow).unwrap_err();
        assert!(matches!(err, EngineError::CycleDetected));
        assert_eq!(err.to_string(), "Cycle detected in workflow");
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let workflow = Workflow::new(vec![node("a")], vec![edge("a", "a")]);
        assert!(matches!(validate_dag(&workflow), Err(EngineError::CycleDetected)));
    }

    #[test]
    fn dangling_edge_names_the_missing_node() {
        let workflow = Workflow::new(vec![node("a")], vec![edge("a", "ghost")]);
        assert!(matches!(
            validate_dag(&workflow),
            Err(EngineError::UnknownNodeReference { node_id }) if node_id == "ghost"
        ));
    }

    #[test]
    fn duplicate_and_empty_ids_are_malformed() {
        let workflow = Workflow::new(vec![node("a"), node("a")], vec![]);
        assert!(matches!(
            validate_dag(&workflow),
            Err(EngineError::DuplicateNodeId(id)) if id == "a"
        ));

        let workflow = Workflow::new(vec![node("")], vec![]);
        assert!(matches!(validate_dag(&workflow), Err(EngineError::EmptyNodeId)));
    }

    #[test]
    fn empty_workflow_is_valid_and_empty() {
        let workflow = Workflow::new(vec![], vec![]);
        assert!(validate_dag(&workflow).unwrap().is_empty());
    }

    #[test]
    fn duplicate_edges_are_tolerated() {
        let workflow =
            Workflow::new(vec![node("a"), node("b")], vec![edge("a", "b"), edge("a", "b")]);
        assert_eq!(validate_dag(&workflow).unwrap(), vec!["a", "b"]);
    }
}
