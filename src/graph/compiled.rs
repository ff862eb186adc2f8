use super::{GraphError, GraphState, NodeFuture, END};
use crate::events::{EventBus, OrchestrationEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

pub(super) type NodeFn<S> =
    Arc<dyn Fn(S) -> NodeFuture<<S as GraphState>::Update> + Send + Sync>;
pub(super) type RouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

pub(super) enum Edge<S> {
    Direct(String),
    Conditional {
        router: RouterFn<S>,
        path_map: HashMap<String, String>,
    },
}

/// Validated graph, ready to run any number of times.
pub struct CompiledGraph<S: GraphState> {
    inner: Arc<Inner<S>>,
    events: Option<Arc<EventBus>>,
}

struct Inner<S: GraphState> {
    name: String,
    nodes: HashMap<String, NodeFn<S>>,
    edges: HashMap<String, Edge<S>>,
    entry_point: String,
    recursion_limit: usize,
}

impl<S: GraphState> Clone for CompiledGraph<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            events: self.events.clone(),
        }
    }
}

impl<S: GraphState> CompiledGraph<S> {
    pub(super) fn new(
        name: String,
        nodes: HashMap<String, NodeFn<S>>,
        edges: HashMap<String, Edge<S>>,
        entry_point: String,
        recursion_limit: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                nodes,
                edges,
                entry_point,
                recursion_limit,
            }),
            events: None,
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Run to completion and return the final state.
    pub async fn invoke(&self, initial: S) -> crate::Result<S> {
        self.execute(initial, None).await
    }

    /// Run in the background, yielding the node name and the merged state
    /// after every node. A failure is sent as the last item.
    pub fn stream(&self, initial: S) -> mpsc::Receiver<crate::Result<(String, S)>> {
        let (tx, rx) = mpsc::channel(16);
        let graph = self.clone();

        tokio::spawn(async move {
            if let Err(e) = graph.execute(initial, Some(&tx)).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        rx
    }

    async fn execute(
        &self,
        mut state: S,
        steps: Option<&mpsc::Sender<crate::Result<(String, S)>>>,
    ) -> crate::Result<S> {
        let inner = &self.inner;
        let mut current = inner.entry_point.clone();
        let mut step = 0;

        while current != END {
            if step >= inner.recursion_limit {
                return Err(GraphError::RecursionLimit(inner.recursion_limit).into());
            }
            step += 1;

            let node = inner
                .nodes
                .get(&current)
                .ok_or_else(|| GraphError::UnknownNode(current.clone()))?;

            tracing::debug!(graph = %inner.name, node = %current, step, "node started");
            self.publish(OrchestrationEvent::NodeStarted {
                graph: inner.name.clone(),
                node: current.clone(),
                step,
            });

            let update = match node(state.clone()).await {
                Ok(update) => update,
                Err(e) => {
                    self.publish(OrchestrationEvent::NodeFailed {
                        graph: inner.name.clone(),
                        node: current.clone(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            };
            state.apply(update);

            self.publish(OrchestrationEvent::NodeCompleted {
                graph: inner.name.clone(),
                node: current.clone(),
                step,
            });

            if let Some(tx) = steps {
                // receiver gone means nobody is watching; keep running
                let _ = tx.send(Ok((current.clone(), state.clone()))).await;
            }

            current = self.next_node(&current, &state)?;
        }

        Ok(state)
    }

    fn next_node(&self, current: &str, state: &S) -> Result<String, GraphError> {
        match self.inner.edges.get(current) {
            None => Ok(END.to_string()),
            Some(Edge::Direct(to)) => Ok(to.clone()),
            Some(Edge::Conditional { router, path_map }) => {
                let key = router(state);
                path_map
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| GraphError::UnmappedRoute {
                        node: current.to_string(),
                        key,
                    })
            }
        }
    }

    fn publish(&self, event: OrchestrationEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}
