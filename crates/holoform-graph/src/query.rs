// ABOUTME: Single-shape caller lookup over the call graph
// ABOUTME: MATCH (a)-[:CALLS]->(b) WHERE b.id == "<id>" RETURN a.id

use crate::call_graph::CallGraph;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static CALLERS_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*MATCH \((\w+)\)-\[:CALLS\]->\((\w+)\) WHERE (\w+)\.id == "([^"]*)" RETURN (\w+)\.id\s*$"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every Holoform id with a call edge to the given id.
    CallersOf(String),
}

impl Query {
    /// Parse the one supported query shape.
    ///
    /// The WHERE variable must be the callee and the RETURN variable the
    /// caller; any other text is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = CALLERS_OF.captures(text)?;
        let caller = caps.get(1)?.as_str();
        let callee = caps.get(2)?.as_str();
        let filtered = caps.get(3)?.as_str();
        let returned = caps.get(5)?.as_str();

        if filtered != callee || returned != caller {
            debug!("Query variables do not line up: {}", text);
            return None;
        }
        Some(Query::CallersOf(caps.get(4)?.as_str().to_string()))
    }
}

pub struct QueryEngine<'g> {
    graph: &'g CallGraph,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g CallGraph) -> Self {
        Self { graph }
    }

    pub fn execute(&self, query: &Query) -> Vec<String> {
        match query {
            Query::CallersOf(target) => self.graph.callers_of(target),
        }
    }

    /// `None` when `text` is not a recognized query.
    pub fn execute_text(&self, text: &str) -> Option<Vec<String>> {
        Query::parse(text).map(|query| self.execute(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> CallGraph {
        let mut graph = CallGraph::new();
        graph.add_edge("main_auto_v1", "load_auto_v1");
        graph.add_edge("main_auto_v1", "save_auto_v1");
        graph.add_edge("batch_auto_v1", "save_auto_v1");
        graph.add_function("load_auto_v1");
        graph.add_function("save_auto_v1");
        graph
    }

    #[test]
    fn parses_callers_query() {
        let query = Query::parse(
            r#"MATCH (caller)-[:CALLS]->(callee) WHERE callee.id == "save_auto_v1" RETURN caller.id"#,
        );
        assert_eq!(query, Some(Query::CallersOf("save_auto_v1".to_string())));
    }

    #[test]
    fn rejects_mismatched_variables() {
        assert_eq!(
            Query::parse(r#"MATCH (a)-[:CALLS]->(b) WHERE a.id == "x" RETURN a.id"#),
            None
        );
        assert_eq!(
            Query::parse(r#"MATCH (a)-[:CALLS]->(b) WHERE b.id == "x" RETURN b.id"#),
            None
        );
        assert_eq!(Query::parse("find callers of x"), None);
        assert_eq!(
            Query::parse(r#"MATCH (a)-[:CALLS*2]->(b) WHERE b.id == "x" RETURN a.id"#),
            None
        );
    }

    #[test]
    fn executes_single_hop_reverse_scan() {
        let graph = graph();
        let engine = QueryEngine::new(&graph);
        assert_eq!(
            engine.execute(&Query::CallersOf("save_auto_v1".to_string())),
            vec!["batch_auto_v1", "main_auto_v1"]
        );
        assert_eq!(
            engine.execute_text(
                r#"MATCH (a)-[:CALLS]->(b) WHERE b.id == "load_auto_v1" RETURN a.id"#
            ),
            Some(vec!["main_auto_v1".to_string()])
        );
        assert_eq!(
            engine.execute_text(
                r#"MATCH (a)-[:CALLS]->(b) WHERE b.id == "main_auto_v1" RETURN a.id"#
            ),
            Some(vec![])
        );
        assert_eq!(engine.execute_text("nonsense"), None);
    }
}
