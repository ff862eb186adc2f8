use super::prompts::{self, TASK_DONE};
use crate::chat::{ChatAgent, ChatAgentResponse};
use crate::error::Result;
use crate::events::EventBus;
use crate::provider::{GenerateOptions, LlmProvider, Message};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RolePlayingConfig {
    pub assistant_role: String,
    pub user_role: String,
    pub task_prompt: String,
    pub with_task_specify: bool,
    pub word_limit: usize,
    pub output_language: Option<String>,
    pub options: GenerateOptions,
}

impl RolePlayingConfig {
    pub fn new(
        assistant_role: impl Into<String>,
        user_role: impl Into<String>,
        task_prompt: impl Into<String>,
    ) -> Self {
        Self {
            assistant_role: assistant_role.into(),
            user_role: user_role.into(),
            task_prompt: task_prompt.into(),
            with_task_specify: true,
            word_limit: 50,
            output_language: None,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_task_specify(mut self, enabled: bool) -> Self {
        self.with_task_specify = enabled;
        self
    }

    pub fn with_output_language(mut self, language: impl Into<String>) -> Self {
        self.output_language = Some(language.into());
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Two agents working a task together: the user role instructs, the
/// assistant role solves one instruction per step.
pub struct RolePlaying {
    task_prompt: String,
    specified_task: Option<String>,
    assistant: ChatAgent,
    user: ChatAgent,
}

impl RolePlaying {
    /// Build the session, asking the model to sharpen the task first when
    /// task specification is enabled.
    pub async fn new(
        config: RolePlayingConfig,
        provider: Arc<dyn LlmProvider>,
        events: Option<Arc<EventBus>>,
    ) -> Result<Self> {
        let specified_task = if config.with_task_specify {
            let mut specifier = ChatAgent::new(
                prompts::TASK_SPECIFIER_ROLE,
                prompts::TASK_SPECIFIER_SYSTEM,
                provider.clone(),
            )
            .with_options(config.options.clone());
            let prompt = prompts::task_specify_prompt(
                &config.assistant_role,
                &config.user_role,
                &config.task_prompt,
                config.word_limit,
            );
            let response = specifier.step(&Message::user(prompt)).await?;
            if response.terminated {
                None
            } else {
                tracing::info!(task = %response.msg.content, "task specified");
                Some(response.msg.content)
            }
        } else {
            None
        };

        let task = specified_task.as_deref().unwrap_or(&config.task_prompt);
        let clause = config
            .output_language
            .as_deref()
            .map(prompts::language_clause)
            .unwrap_or_default();

        let assistant_prompt =
            prompts::assistant_system_prompt(&config.assistant_role, &config.user_role, task)
                + &clause;
        let user_prompt =
            prompts::user_system_prompt(&config.assistant_role, &config.user_role, task) + &clause;

        let mut assistant = ChatAgent::new(&config.assistant_role, assistant_prompt, provider.clone())
            .with_options(config.options.clone());
        let mut user = ChatAgent::new(&config.user_role, user_prompt, provider)
            .with_options(config.options);
        if let Some(events) = events {
            assistant = assistant.with_events(events.clone());
            user = user.with_events(events);
        }

        Ok(Self {
            task_prompt: config.task_prompt,
            specified_task,
            assistant,
            user,
        })
    }

    pub fn task_prompt(&self) -> &str {
        &self.task_prompt
    }

    pub fn specified_task(&self) -> Option<&str> {
        self.specified_task.as_deref()
    }

    pub fn assistant_role(&self) -> &str {
        self.assistant.role_name()
    }

    pub fn user_role(&self) -> &str {
        self.user.role_name()
    }

    pub fn assistant_system_message(&self) -> &Message {
        self.assistant.system_message()
    }

    pub fn user_system_message(&self) -> &Message {
        self.user.system_message()
    }

    /// Reset both agents and return the assistant's opening message.
    pub fn init_chat(&mut self) -> Message {
        self.assistant.reset();
        self.user.reset();
        Message::assistant(prompts::OPENING_MESSAGE)
    }

    /// One exchange: the user role instructs in reply to `assistant_msg`,
    /// then the assistant answers the instruction.
    ///
    /// Returns `(assistant_response, user_response)`. When the user role
    /// ends the task the assistant is not called and its response comes
    /// back empty and terminated.
    pub async fn step(
        &mut self,
        assistant_msg: &Message,
    ) -> Result<(ChatAgentResponse, ChatAgentResponse)> {
        let mut user_response = self.user.step(assistant_msg).await?;
        if user_response.msg.content.contains(TASK_DONE) {
            user_response.terminated = true;
        }
        if user_response.terminated {
            let assistant_response = ChatAgentResponse {
                msg: Message::assistant(""),
                terminated: true,
                finish_reason: None,
            };
            return Ok((assistant_response, user_response));
        }

        let assistant_response = self.assistant.step(&user_response.msg).await?;
        Ok((assistant_response, user_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Role, ScriptedProvider};

    #[tokio::test]
    async fn test_task_specification() {
        let provider = ScriptedProvider::new(["Design a chat queue with retries."]);
        let session = RolePlaying::new(
            RolePlayingConfig::new("Architect", "Product Manager", "Design a system"),
            Arc::new(provider.clone()),
            None,
        )
        .await
        .unwrap();

        assert_eq!(session.specified_task(), Some("Design a chat queue with retries."));
        assert!(session
            .assistant_system_message()
            .content
            .contains("Here is the task: Design a chat queue with retries."));

        let prompt = &provider.requests()[0].messages[1].content;
        assert!(prompt.contains("Architect will help Product Manager to complete: Design a system."));
        assert!(prompt.contains("50 words or less"));
    }

    #[tokio::test]
    async fn test_step_order_and_history() {
        let provider = ScriptedProvider::new([
            "Instruction: list modules\nInput: None",
            "Solution: api, worker. Next request.",
        ]);
        let mut session = RolePlaying::new(
            RolePlayingConfig::new("Architect", "PM", "Design").with_task_specify(false),
            Arc::new(provider.clone()),
            None,
        )
        .await
        .unwrap();

        let opening = session.init_chat();
        let (assistant, user) = session.step(&opening).await.unwrap();
        assert_eq!(user.msg.content, "Instruction: list modules\nInput: None");
        assert_eq!(assistant.msg.content, "Solution: api, worker. Next request.");

        let requests = provider.requests();
        // user role sees the opening message as input
        assert_eq!(requests[0].messages[1], Message::user(prompts::OPENING_MESSAGE));
        // assistant role sees the instruction
        assert_eq!(requests[1].messages[1].role, Role::User);
        assert_eq!(requests[1].messages[1].content, user.msg.content);
    }

    #[tokio::test]
    async fn test_task_done_terminates() {
        let provider = ScriptedProvider::new([TASK_DONE]);
        let mut session = RolePlaying::new(
            RolePlayingConfig::new("A", "U", "t").with_task_specify(false),
            Arc::new(provider.clone()),
            None,
        )
        .await
        .unwrap();

        let opening = session.init_chat();
        let (assistant, user) = session.step(&opening).await.unwrap();
        assert!(user.terminated);
        assert!(assistant.terminated);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_output_language_clause() {
        let session = RolePlaying::new(
            RolePlayingConfig::new("A", "U", "t")
                .with_task_specify(false)
                .with_output_language("Chinese"),
            Arc::new(ScriptedProvider::default()),
            None,
        )
        .await
        .unwrap();
        assert!(session
            .user_system_message()
            .content
            .ends_with("you must output text in Chinese."));
    }
}
