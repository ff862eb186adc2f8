use crate::error::Result;
use crate::events::{EventBus, OrchestrationEvent};
use crate::memory::Memory;
use crate::provider::{GenerateOptions, LlmProvider, Message, Role};
use std::sync::Arc;

/// Reply of a [`ChatAgent`] for a single step.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatAgentResponse {
    pub msg: Message,
    pub terminated: bool,
    pub finish_reason: Option<String>,
}

/// Stateful conversational agent: a role name, a system message and the
/// running conversation with the model.
pub struct ChatAgent {
    role_name: String,
    system_message: Message,
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
    memory: Memory,
    events: Option<Arc<EventBus>>,
}

impl ChatAgent {
    pub fn new(
        role_name: impl Into<String>,
        system_message: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let system_message = Message::system(system_message);
        let mut memory = Memory::new();
        memory.add(system_message.clone());

        Self {
            role_name: role_name.into(),
            system_message,
            provider,
            options: GenerateOptions::default(),
            memory,
            events: None,
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    pub fn system_message(&self) -> &Message {
        &self.system_message
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Forget the conversation, keeping the system message.
    pub fn reset(&mut self) {
        self.memory.reset();
    }

    /// Answer `input`, which is recorded as coming from the other party.
    ///
    /// An empty reply marks the response as terminated and is not stored.
    pub async fn step(&mut self, input: &Message) -> Result<ChatAgentResponse> {
        self.memory.add(Message::new(Role::User, input.content.clone()));

        let response = self
            .provider
            .generate(self.memory.messages().to_vec(), Some(self.options.clone()))
            .await?;

        let content = response.content.trim().to_string();
        if content.is_empty() {
            tracing::warn!(role = %self.role_name, "model returned an empty reply");
            return Ok(ChatAgentResponse {
                msg: Message::assistant(""),
                terminated: true,
                finish_reason: response.finish_reason,
            });
        }

        let msg = Message::assistant(content);
        self.memory.add(msg.clone());

        if let Some(events) = &self.events {
            events.publish(OrchestrationEvent::AgentMessage {
                agent: self.role_name.clone(),
                content: msg.content.clone(),
            });
        }

        Ok(ChatAgentResponse {
            msg,
            terminated: false,
            finish_reason: response.finish_reason,
        })
    }
}
