use super::compiled::{CompiledGraph, Edge, NodeFn, RouterFn};
use super::{GraphError, GraphState, NodeFuture, DEFAULT_RECURSION_LIMIT, END};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

/// Builder for a [`CompiledGraph`].
///
/// Structural mistakes are only reported by [`compile`](Self::compile).
pub struct StateGraph<S: GraphState> {
    name: String,
    nodes: Vec<(String, NodeFn<S>)>,
    edges: Vec<(String, Edge<S>)>,
    entry_point: Option<String>,
    recursion_limit: usize,
}

impl<S: GraphState> StateGraph<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            entry_point: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn add_node<F, Fut>(&mut self, name: impl Into<String>, node: F) -> &mut Self
    where
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<S::Update>> + Send + 'static,
    {
        let node: NodeFn<S> =
            Arc::new(move |state: S| -> NodeFuture<S::Update> { Box::pin(node(state)) });
        self.nodes.push((name.into(), node));
        self
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), Edge::Direct(to.into())));
        self
    }

    /// Route out of `from` by a key computed from the state; `path_map`
    /// translates keys into node names (or [`END`]).
    pub fn add_conditional_edges<R, K, V>(
        &mut self,
        from: impl Into<String>,
        router: R,
        path_map: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        R: Fn(&S) -> String + Send + Sync + 'static,
        K: Into<String>,
        V: Into<String>,
    {
        let router: RouterFn<S> = Arc::new(router);
        let path_map = path_map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.edges
            .push((from.into(), Edge::Conditional { router, path_map }));
        self
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry_point = Some(name.into());
        self
    }

    pub fn set_recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    pub fn compile(self) -> Result<CompiledGraph<S>, GraphError> {
        let mut names = HashSet::new();
        for (name, _) in &self.nodes {
            if name == END {
                return Err(GraphError::ReservedName(name.clone()));
            }
            if !names.insert(name.clone()) {
                return Err(GraphError::DuplicateNode(name.clone()));
            }
        }

        let entry_point = self.entry_point.ok_or(GraphError::MissingEntryPoint)?;
        if !names.contains(&entry_point) {
            return Err(GraphError::UnknownNode(entry_point));
        }

        let known = |target: &str| target == END || names.contains(target);

        let mut edges = HashMap::new();
        for (from, edge) in self.edges {
            if !names.contains(&from) {
                return Err(GraphError::UnknownNode(from));
            }
            match &edge {
                Edge::Direct(to) => {
                    if !known(to.as_str()) {
                        return Err(GraphError::UnknownNode(to.clone()));
                    }
                }
                Edge::Conditional { path_map, .. } => {
                    if let Some(target) = path_map.values().find(|t| !known(t.as_str())) {
                        return Err(GraphError::UnknownNode(target.clone()));
                    }
                }
            }
            if edges.insert(from.clone(), edge).is_some() {
                return Err(GraphError::ConflictingEdges(from));
            }
        }

        Ok(CompiledGraph::new(
            self.name,
            self.nodes.into_iter().collect(),
            edges,
            entry_point,
            self.recursion_limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Counter(u32);

    impl GraphState for Counter {
        type Update = u32;

        fn apply(&mut self, update: u32) {
            self.0 += update;
        }
    }

    fn two_nodes() -> StateGraph<Counter> {
        let mut graph = StateGraph::new("test");
        graph.add_node("a", |_: Counter| async { Ok(1) });
        graph.add_node("b", |_: Counter| async { Ok(1) });
        graph
    }

    #[test]
    fn test_missing_entry_point() {
        let graph = two_nodes();
        assert_eq!(graph.compile().err(), Some(GraphError::MissingEntryPoint));
    }

    #[test]
    fn test_unknown_entry_point() {
        let mut graph = two_nodes();
        graph.set_entry_point("z");
        assert_eq!(
            graph.compile().err(),
            Some(GraphError::UnknownNode("z".into()))
        );
    }

    #[test]
    fn test_duplicate_and_reserved_names() {
        let mut graph = two_nodes();
        graph.add_node("a", |_: Counter| async { Ok(0) });
        graph.set_entry_point("a");
        assert_eq!(
            graph.compile().err(),
            Some(GraphError::DuplicateNode("a".into()))
        );

        let mut graph = two_nodes();
        graph.add_node(END, |_: Counter| async { Ok(0) });
        graph.set_entry_point("a");
        assert_eq!(
            graph.compile().err(),
            Some(GraphError::ReservedName(END.into()))
        );
    }

    #[test]
    fn test_edge_validation() {
        let mut graph = two_nodes();
        graph.set_entry_point("a").add_edge("a", "missing");
        assert_eq!(
            graph.compile().err(),
            Some(GraphError::UnknownNode("missing".into()))
        );

        let mut graph = two_nodes();
        graph
            .set_entry_point("a")
            .add_edge("a", "b")
            .add_conditional_edges("a", |_| "x".to_string(), [("x", END)]);
        assert_eq!(
            graph.compile().err(),
            Some(GraphError::ConflictingEdges("a".into()))
        );

        let mut graph = two_nodes();
        graph
            .set_entry_point("a")
            .add_conditional_edges("a", |_| "x".to_string(), [("x", "nowhere")]);
        assert_eq!(
            graph.compile().err(),
            Some(GraphError::UnknownNode("nowhere".into()))
        );
    }

    #[test]
    fn test_valid_graph_compiles() {
        let mut graph = two_nodes();
        graph.set_entry_point("a").add_edge("a", "b").add_edge("b", END);
        assert!(graph.compile().is_ok());
    }
}
