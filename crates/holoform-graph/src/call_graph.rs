// ABOUTME: Unresolved caller -> callee adjacency derived from function Holoforms
// ABOUTME: Edges are built from call names only; no check that the callee exists

use holoform_core::schema::holoform_id;
use holoform_core::Holoform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Holoform id -> ids it calls, in operation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per function Holoform, with an edge for every assigned
    /// function or constructor call in its own top-level operation list.
    pub fn from_holoforms<'a>(holoforms: impl IntoIterator<Item = &'a Holoform>) -> Self {
        let mut graph = Self::new();
        for function in holoforms.into_iter().filter_map(Holoform::as_function) {
            graph.add_function(&function.id);
            for callee in function.direct_calls() {
                graph.add_edge(&function.id, holoform_id(callee));
            }
        }
        graph
    }

    pub fn add_function(&mut self, id: &str) {
        self.edges.entry(id.to_string()).or_default();
    }

    /// Duplicate edges are kept.
    pub fn add_edge(&mut self, caller: &str, callee: impl Into<String>) {
        self.edges
            .entry(caller.to_string())
            .or_default()
            .push(callee.into());
    }

    /// Forward single hop.
    pub fn callees_of(&self, id: &str) -> Option<&[String]> {
        self.edges.get(id).map(Vec::as_slice)
    }

    /// Reverse single hop: every id with an edge to `id`, sorted, each once.
    pub fn callers_of(&self, id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|(_, callees)| callees.iter().any(|c| c == id))
            .map(|(caller, _)| caller.clone())
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.edges.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callers_are_sorted_and_unique() {
        let mut graph = CallGraph::new();
        graph.add_edge("z_auto_v1", "g_auto_v1");
        graph.add_edge("a_auto_v1", "g_auto_v1");
        graph.add_edge("a_auto_v1", "g_auto_v1");
        graph.add_function("g_auto_v1");

        assert_eq!(graph.callers_of("g_auto_v1"), vec!["a_auto_v1", "z_auto_v1"]);
        assert_eq!(graph.callees_of("a_auto_v1").unwrap().len(), 2);
        assert_eq!(graph.callees_of("g_auto_v1"), Some(&[][..]));
        assert_eq!(graph.callees_of("unknown"), None);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut graph = CallGraph::new();
        graph.add_edge("f_auto_v1", "g_auto_v1");
        graph.add_function("g_auto_v1");
        assert_eq!(
            serde_json::to_string(&graph).unwrap(),
            r#"{"f_auto_v1":["g_auto_v1"],"g_auto_v1":[]}"#
        );
    }
}
