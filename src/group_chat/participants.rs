use super::messages::ChatMessage;
use crate::error::{AgentError, Result};
use crate::events::EventBus;
use crate::provider::{GenerateOptions, LlmProvider, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A member of a group chat team.
#[async_trait]
pub trait Participant: Send + Sync {
    fn name(&self) -> &str;

    /// Produce this participant's next message given the full transcript.
    async fn respond(&self, history: &[ChatMessage]) -> Result<String>;
}

/// Model-backed participant with a fixed system message.
pub struct AssistantAgent {
    name: String,
    system_message: String,
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
}

impl AssistantAgent {
    pub fn new(
        name: impl Into<String>,
        system_message: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            system_message: system_message.into(),
            provider,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Own messages go back as assistant turns, everyone else's as user turns.
    fn model_context(&self, history: &[ChatMessage]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(&self.system_message));
        messages.extend(history.iter().map(|m| {
            if m.source == self.name {
                Message::assistant(&m.content)
            } else {
                Message::user(&m.content)
            }
        }));
        messages
    }
}

#[async_trait]
impl Participant for AssistantAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, history: &[ChatMessage]) -> Result<String> {
        let response = self
            .provider
            .generate(self.model_context(history), Some(self.options.clone()))
            .await?;
        Ok(response.content)
    }
}

/// Where a [`UserProxyAgent`] gets its replies.
#[async_trait]
pub trait UserInput: Send + Sync {
    async fn read(&self, prompt: &str) -> Result<String>;
}

/// Longest wait for the transcript to catch up before prompting.
const TRANSCRIPT_WAIT: Duration = Duration::from_secs(120);

/// Reads one line from the terminal.
///
/// With an event bus attached, the prompt is held back until the monitor
/// has printed every earlier event.
#[derive(Default)]
pub struct StdinInput {
    events: Option<Arc<EventBus>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }
}

#[async_trait]
impl UserInput for StdinInput {
    async fn read(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.to_string();
        let events = self.events.clone();
        tokio::task::spawn_blocking(move || -> Result<String> {
            use std::io::Write;
            if let Some(events) = events {
                if !events.wait_until_observed(TRANSCRIPT_WAIT) {
                    tracing::warn!("transcript still printing, prompting anyway");
                }
            }
            print!("{}", prompt);
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok(line.trim_end_matches(['\r', '\n']).to_string())
        })
        .await
        .map_err(|e| AgentError::ToolExecutionFailed(format!("input task failed: {}", e)))?
    }
}

/// Replays prepared answers, then empty strings.
#[derive(Default)]
pub struct ScriptedInput {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedInput {
    pub fn new(answers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl UserInput for ScriptedInput {
    async fn read(&self, _prompt: &str) -> Result<String> {
        Ok(self
            .answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_default())
    }
}

/// Participant that stands in for a human.
pub struct UserProxyAgent {
    name: String,
    input: Box<dyn UserInput>,
}

impl UserProxyAgent {
    pub fn new(name: impl Into<String>, input: Box<dyn UserInput>) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }
}

#[async_trait]
impl Participant for UserProxyAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, _history: &[ChatMessage]) -> Result<String> {
        self.input.read("Enter your response: ").await
    }
}
