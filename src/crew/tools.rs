use super::agent::CrewAgent;
use crate::agent::{Agent, AgentOptions};
use crate::provider::{GenerateOptions, LlmProvider};
use crate::tool::{FnTool, Tool, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DELEGATE_WORK: &str = "delegate_work";
pub const ASK_QUESTION: &str = "ask_question";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationKind {
    DelegateWork,
    AskQuestion,
}

impl DelegationKind {
    fn request_field(&self) -> &'static str {
        match self {
            DelegationKind::DelegateWork => "task",
            DelegationKind::AskQuestion => "question",
        }
    }
}

/// Lets a crew member hand work to, or ask something of, a coworker.
///
/// The coworker runs as a one-shot agent with its own tools but without
/// delegation, so requests never bounce back.
pub struct DelegationTool {
    kind: DelegationKind,
    coworkers: Vec<CrewAgent>,
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
}

impl DelegationTool {
    pub fn new(
        kind: DelegationKind,
        coworkers: Vec<CrewAgent>,
        provider: Arc<dyn LlmProvider>,
        options: GenerateOptions,
    ) -> Self {
        Self {
            kind,
            coworkers,
            provider,
            options,
        }
    }

    fn find_coworker(&self, name: &str) -> Option<&CrewAgent> {
        let name = name.trim().trim_matches('"');
        self.coworkers
            .iter()
            .find(|c| c.role == name)
    }
}

#[async_trait]
impl Tool for DelegationTool {
    fn name(&self) -> &str {
        match self.kind {
            DelegationKind::DelegateWork => DELEGATE_WORK,
            DelegationKind::AskQuestion => ASK_QUESTION,
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            DelegationKind::DelegateWork => {
                "Delegate a specific task to one of your coworkers. Provide the task and all the context they need, they know nothing about it otherwise."
            }
            DelegationKind::AskQuestion => {
                "Ask a specific question to one of your coworkers. Provide the question and all the context they need, they know nothing about it otherwise."
            }
        }
    }

    fn parameters_schema(&self) -> Value {
        let roles: Vec<&str> = self.coworkers.iter().map(|c| c.role.as_str()).collect();
        let field = self.kind.request_field();

        let mut properties = serde_json::Map::new();
        properties.insert(field.to_string(), json!({ "type": "string" }));
        properties.insert("context".to_string(), json!({ "type": "string" }));
        properties.insert(
            "coworker".to_string(),
            json!({ "type": "string", "enum": roles }),
        );

        json!({
            "type": "object",
            "properties": properties,
            "required": [field, "context", "coworker"],
        })
    }

    async fn execute(&self, params: &Value) -> ToolResult {
        let coworker_name = params["coworker"].as_str().unwrap_or_default();
        let Some(coworker) = self.find_coworker(coworker_name) else {
            return ToolResult::error(format!("Unknown coworker: {}", coworker_name));
        };

        let request = params[self.kind.request_field()]
            .as_str()
            .unwrap_or_default();
        let context = params["context"].as_str().unwrap_or_default();

        let mut agent = Agent::new(coworker.role.clone(), self.provider.clone()).with_options(
            AgentOptions::default()
                .with_system_prompt(coworker.system_prompt())
                .with_max_iterations(coworker.max_iterations)
                .with_generate_options(self.options.clone()),
        );
        for tool in &coworker.tools {
            agent.register_tool(tool.clone()).await;
        }

        let input = format!(
            "Current Task: {}\n\nThis is the context you're working with:\n{}",
            request, context
        );

        tracing::info!(coworker = %coworker.role, kind = ?self.kind, "delegating to coworker");
        match agent.run(&input).await {
            Ok(answer) => ToolResult::success(answer),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

pub fn analyze_technical_requirements() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "分析技术需求",
        "分析技术需求并提取关键信息",
        "requirements",
        |requirements| format!("已分析需求：{}，提取了关键功能点和非功能需求。", requirements),
    ))
}

pub fn generate_architecture_doc() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "生成架构文档",
        "生成架构设计文档",
        "architecture",
        |architecture| format!("已生成架构文档，包含：{}", architecture),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProvider;

    fn coworkers() -> Vec<CrewAgent> {
        vec![CrewAgent::new("Tester", "Find bugs", "Careful.")]
    }

    #[tokio::test]
    async fn test_delegate_runs_coworker() {
        let provider = ScriptedProvider::new(["Three test cases."]);
        let tool = DelegationTool::new(
            DelegationKind::DelegateWork,
            coworkers(),
            Arc::new(provider.clone()),
            GenerateOptions::default(),
        );

        let params = json!({"task": "Write tests", "context": "login form", "coworker": "Tester"});
        assert!(tool.validate_parameters(&params).is_ok());

        let result = tool.execute(&params).await;
        assert!(result.success);
        assert_eq!(result.content, "Three test cases.");

        let sent = &provider.requests()[0].messages;
        assert!(sent[0].content.starts_with("You are Tester. Careful."));
        assert!(sent[1].content.contains("Current Task: Write tests"));
        assert!(sent[1].content.contains("login form"));
    }

    #[tokio::test]
    async fn test_unknown_coworker() {
        let tool = DelegationTool::new(
            DelegationKind::AskQuestion,
            coworkers(),
            Arc::new(ScriptedProvider::default()),
            GenerateOptions::default(),
        );
        let result = tool
            .execute(&json!({"question": "?", "context": "", "coworker": "Nobody"}))
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown coworker: Nobody"));
    }

    #[tokio::test]
    async fn test_coworker_lookup_matches_schema_case() {
        let tool = DelegationTool::new(
            DelegationKind::DelegateWork,
            coworkers(),
            Arc::new(ScriptedProvider::default()),
            GenerateOptions::default(),
        );
        let params = json!({"task": "t", "context": "c", "coworker": "tester"});
        assert!(tool.validate_parameters(&params).is_err());

        let result = tool.execute(&params).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown coworker: tester"));
    }

    #[tokio::test]
    async fn test_schema_lists_coworkers() {
        let tool = DelegationTool::new(
            DelegationKind::AskQuestion,
            coworkers(),
            Arc::new(ScriptedProvider::default()),
            GenerateOptions::default(),
        );
        let schema = tool.parameters_schema();
        assert_eq!(schema["properties"]["coworker"]["enum"], json!(["Tester"]));
        assert_eq!(schema["required"][0], "question");
        assert!(tool
            .validate_parameters(&json!({"question": "q", "context": "c", "coworker": "Tester"}))
            .is_ok());
    }

    #[tokio::test]
    async fn test_architect_tools() {
        let tool = analyze_technical_requirements();
        let result = tool.execute(&json!({"requirements": "登录"})).await;
        assert_eq!(
            result.content,
            "已分析需求：登录，提取了关键功能点和非功能需求。"
        );
        let doc = generate_architecture_doc()
            .execute(&json!({"architecture": "微服务"}))
            .await;
        assert_eq!(doc.content, "已生成架构文档，包含：微服务");
    }
}
