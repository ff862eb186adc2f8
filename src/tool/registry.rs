use super::{Tool, ToolInfo, ToolResult};
use crate::error::AgentError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Named tool set shared between an agent and its executor
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<RwLock<BTreeMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        tracing::debug!(tool = %name, "registering tool");
        self.tools.write().await.insert(name, tool);
    }

    pub async fn execute_tool(&self, name: &str, params: &serde_json::Value) -> ToolResult {
        let tool = self.tools.read().await.get(name).cloned();
        let Some(tool) = tool else {
            return ToolResult::error(AgentError::ToolNotFound(name.to_string()).to_string());
        };

        if let Err(validation_error) = tool.validate_parameters(params) {
            return ToolResult::error(AgentError::InvalidParameters(validation_error).to_string());
        }

        tool.execute(params).await
    }

    /// Tools sorted by name
    pub async fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .read()
            .await
            .values()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters_schema: tool.parameters_schema(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::FnTool;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_execute() {
        let registry = ToolRegistry::new();
        registry
            .register(Arc::new(FnTool::new("upper", "Uppercase", "text", |s| {
                s.to_uppercase()
            })))
            .await;

        let result = registry.execute_tool("upper", &json!({ "text": "abc" })).await;
        assert_eq!(result.content, "ABC");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let result = registry.execute_tool("missing", &json!({})).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Tool not found: missing"));
    }

    #[tokio::test]
    async fn test_validation_failure_short_circuits() {
        let registry = ToolRegistry::new();
        registry
            .register(Arc::new(FnTool::new("upper", "Uppercase", "text", |s| {
                s.to_uppercase()
            })))
            .await;

        let result = registry.execute_tool("upper", &json!({})).await;
        assert!(result.error.unwrap().starts_with("Invalid parameters: "));
    }
}
