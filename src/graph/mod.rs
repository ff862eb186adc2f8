//! In-process state machine runner.
//!
//! A graph is a set of named async nodes over a shared state type. Each node
//! returns a partial update that the state merges via [`GraphState::apply`];
//! edges (direct or routed by a function of the state) pick the next node
//! until [`END`] is reached.

mod builder;
mod compiled;

pub use builder::StateGraph;
pub use compiled::CompiledGraph;

use std::future::Future;
use std::pin::Pin;

/// Terminal pseudo-node.
pub const END: &str = "__end__";

/// Default number of node executions allowed in one run.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// State threaded from node to node.
pub trait GraphState: Clone + Send + Sync + 'static {
    /// Partial state returned by a node
    type Update: Send + 'static;

    /// Merge a node's update into the state.
    fn apply(&mut self, update: Self::Update);
}

pub type NodeFuture<U> = Pin<Box<dyn Future<Output = crate::Result<U>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Graph has no entry point")]
    MissingEntryPoint,

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Reserved node name: {0}")]
    ReservedName(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Node {0} has more than one outgoing edge rule")]
    ConflictingEdges(String),

    #[error("Router of node {node} returned unmapped key: {key}")]
    UnmappedRoute { node: String, key: String },

    #[error("Recursion limit of {0} reached without hitting a stop condition")]
    RecursionLimit(usize),
}
