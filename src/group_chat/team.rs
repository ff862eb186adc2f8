use super::messages::{ChatMessage, TaskResult};
use super::participants::Participant;
use super::termination::TerminationCondition;
use crate::error::{AgentError, Result};
use crate::events::{EventBus, OrchestrationEvent};
use std::collections::HashSet;
use std::sync::Arc;

/// Source name recorded on the task message.
pub const TASK_SOURCE: &str = "user";

/// Participants speak in fixed order, each seeing the whole transcript,
/// until the termination condition fires or `max_turns` is used up.
pub struct RoundRobinGroupChat {
    participants: Vec<Box<dyn Participant>>,
    termination: Option<Box<dyn TerminationCondition>>,
    max_turns: Option<usize>,
    events: Option<Arc<EventBus>>,
}

impl RoundRobinGroupChat {
    pub fn new(participants: Vec<Box<dyn Participant>>) -> Result<Self> {
        if participants.is_empty() {
            return Err(AgentError::config("A group chat needs at least one participant"));
        }
        let mut names = HashSet::new();
        for participant in &participants {
            if !names.insert(participant.name().to_string()) {
                return Err(AgentError::config(format!(
                    "Duplicate participant name: {}",
                    participant.name()
                )));
            }
        }

        Ok(Self {
            participants,
            termination: None,
            max_turns: None,
            events: None,
        })
    }

    pub fn with_termination(mut self, condition: impl TerminationCondition + 'static) -> Self {
        self.termination = Some(Box::new(condition));
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn participant_names(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.name()).collect()
    }

    pub async fn run(&mut self, task: &str) -> Result<TaskResult> {
        if let Some(termination) = self.termination.as_mut() {
            termination.reset();
        }

        let task_message = ChatMessage::new(TASK_SOURCE, task);
        self.publish_message(&task_message);
        let mut messages = vec![task_message];

        let mut stop_reason = self.check_termination(&messages);
        let mut turn = 0;

        while stop_reason.is_none() {
            if self.max_turns.is_some_and(|max| turn >= max) {
                stop_reason = self
                    .max_turns
                    .map(|max| format!("Maximum number of turns {} reached.", max));
                break;
            }

            let speaker = &self.participants[turn % self.participants.len()];
            tracing::debug!(speaker = %speaker.name(), turn, "group chat turn");
            let content = speaker.respond(&messages).await?;
            let message = ChatMessage::new(speaker.name(), content);
            self.publish_message(&message);

            messages.push(message);
            turn += 1;

            let last = messages.len() - 1;
            stop_reason = self.check_termination(&messages[last..]);
        }

        tracing::info!(turns = turn, reason = ?stop_reason, "group chat stopped");
        Ok(TaskResult {
            messages,
            stop_reason,
        })
    }

    fn check_termination(&mut self, new_messages: &[ChatMessage]) -> Option<String> {
        self.termination
            .as_mut()
            .and_then(|condition| condition.check(new_messages))
    }

    fn publish_message(&self, message: &ChatMessage) {
        if let Some(events) = &self.events {
            events.publish(OrchestrationEvent::AgentMessage {
                agent: message.source.clone(),
                content: message.content.clone(),
            });
        }
    }
}
