use super::options::{AgentOptions, ToolChoice};
use crate::error::{AgentError, Result};
use crate::events::EventBus;
use crate::provider::{LlmProvider, Message};
use crate::tool::{Tool, ToolCallParser, ToolExecutor, ToolRegistry, ToolResult};
use std::sync::Arc;

/// Tool-using agent: asks the model, runs any tool calls it finds in the
/// reply, feeds the results back, and stops at the first reply without calls.
pub struct Agent {
    name: String,
    provider: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    executor: ToolExecutor,
    conversation: Vec<Message>,
    options: AgentOptions,
}

impl Agent {
    pub fn new(name: impl Into<String>, provider: Arc<dyn LlmProvider>) -> Self {
        let tools = ToolRegistry::new();
        let executor = ToolExecutor::new(tools.clone());

        Self {
            name: name.into(),
            provider,
            tools,
            executor,
            conversation: Vec::new(),
            options: AgentOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.executor = ToolExecutor::new(self.tools.clone()).with_events(self.name.clone(), events);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        self.tools.register(tool).await;
    }

    /// Messages exchanged during the last `run`
    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub async fn run(&mut self, input: &str) -> Result<String> {
        self.conversation.clear();

        if let Some(system_prompt) = &self.options.system_prompt {
            self.conversation.push(Message::system(system_prompt));
        }

        if self.options.tool_choice == ToolChoice::Auto {
            let tools_desc = self.format_tools_description().await;
            if !tools_desc.is_empty() {
                let tool_prompt = format!(
                    "You have access to the following tools:\n{}\n\nTo use a tool, respond with JSON in this format:\n{{\n  \"tool_calls\": [\n    {{\n      \"id\": \"call_1\",\n      \"name\": \"tool_name\",\n      \"parameters\": {{\n        \"param1\": \"value1\"\n      }}\n    }}\n  ]\n}}\nWhen you have the final answer, reply with it directly and no tool calls.",
                    tools_desc
                );
                self.conversation.push(Message::system(tool_prompt));
            }
        }

        self.conversation.push(Message::user(input));

        for iteration in 0..self.options.max_iterations {
            tracing::debug!(agent = %self.name, iteration, "agent turn");

            let response = self
                .provider
                .generate(
                    self.conversation.clone(),
                    Some(self.options.generate_options.clone()),
                )
                .await?;

            self.conversation.push(Message::assistant(&response.content));

            let tool_calls = if self.options.tool_choice == ToolChoice::Auto {
                ToolCallParser::extract_from_content(&response.content)
            } else {
                Vec::new()
            };

            if tool_calls.is_empty() {
                return Ok(response.content);
            }

            let results = self.executor.execute_calls(tool_calls).await;
            let results_text = format_tool_results(&results);

            self.conversation
                .push(Message::user(format!("Tool results:\n{}", results_text)));
        }

        Err(AgentError::MaxIterations(self.options.max_iterations))
    }

    async fn format_tools_description(&self) -> String {
        self.tools
            .list_tools()
            .await
            .iter()
            .map(|tool| {
                format!(
                    "- {}: {} (parameters: {})",
                    tool.name, tool.description, tool.parameters_schema
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_tool_results(results: &[ToolResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            if result.success {
                format!("Result {}: {}", i + 1, result.content)
            } else {
                format!(
                    "Error {}: {}",
                    i + 1,
                    result.error.as_deref().unwrap_or("Unknown error")
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
