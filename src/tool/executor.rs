use super::{ToolCall, ToolRegistry, ToolResult};
use crate::events::{EventBus, OrchestrationEvent};
use std::sync::Arc;

/// Runs parsed tool calls one after another, reporting each to the event bus
pub struct ToolExecutor {
    registry: ToolRegistry,
    events: Option<Arc<EventBus>>,
    agent: String,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            events: None,
            agent: String::new(),
        }
    }

    pub fn with_events(mut self, agent: impl Into<String>, events: Arc<EventBus>) -> Self {
        self.agent = agent.into();
        self.events = Some(events);
        self
    }

    pub async fn execute_calls(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute_single(&call).await);
        }
        results
    }

    pub async fn execute_single(&self, call: &ToolCall) -> ToolResult {
        self.publish(OrchestrationEvent::ToolCallStarted {
            agent: self.agent.clone(),
            call: call.clone(),
        });

        let result = self
            .registry
            .execute_tool(&call.name, &call.parameters)
            .await;

        if !result.success {
            tracing::warn!(tool = %call.name, error = ?result.error, "tool call failed");
        }

        self.publish(OrchestrationEvent::ToolCallCompleted {
            agent: self.agent.clone(),
            call: call.clone(),
            result: result.clone(),
        });
        result
    }

    fn publish(&self, event: OrchestrationEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}
