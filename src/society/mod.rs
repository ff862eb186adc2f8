//! Role-playing society: two chat agents taking turns on a shared task.

pub mod prompts;
mod role_playing;

pub use role_playing::{RolePlaying, RolePlayingConfig};

use crate::chat::ChatAgentResponse;
use crate::events::{EventBus, OrchestrationEvent};
use crate::provider::{GenerateOptions, LlmProvider};
use std::sync::Arc;

pub const SINGLE_TASK: &str = "设计一个多智能体协作系统的技术架构。需要考虑：1）智能体之间的通信机制；2）任务分配和协调策略；3）系统的可扩展性和容错性；4）关键技术选型建议。";

pub const RELAY_TASK: &str = "协作开发一个多智能体协作平台。产品经理先提出需求，架构师设计架构，开发工程师实现功能，测试工程师进行测试。";

/// `(assistant role, user role, task)` for each leg of the relay.
pub const RELAY_LEGS: [(&str, &str, &str); 3] = [
    (
        "软件架构师",
        "技术产品经理",
        "产品经理提出多智能体协作平台的需求，架构师设计技术架构方案。",
    ),
    (
        "开发工程师",
        "软件架构师",
        "架构师向开发工程师说明架构设计，开发工程师实现具体功能模块。",
    ),
    (
        "测试工程师",
        "开发工程师",
        "开发工程师向测试工程师说明实现的功能，测试工程师设计测试策略和测试用例。",
    ),
];

#[derive(Debug, Clone)]
pub struct Exchange {
    pub assistant: ChatAgentResponse,
    pub user: ChatAgentResponse,
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub assistant_role: String,
    pub user_role: String,
    pub exchanges: Vec<Exchange>,
    pub terminated: bool,
    /// Set when a step failed; the session stops at that step.
    pub error: Option<String>,
}

/// Drive a session for at most `turn_limit` steps.
///
/// Each step answers the assistant's previous reply, starting from the
/// opening message of `init_chat`.
pub async fn run_session(session: &mut RolePlaying, turn_limit: usize) -> SessionOutcome {
    let mut outcome = SessionOutcome {
        assistant_role: session.assistant_role().to_string(),
        user_role: session.user_role().to_string(),
        exchanges: Vec::new(),
        terminated: false,
        error: None,
    };

    let mut input = session.init_chat();
    for turn in 1..=turn_limit {
        match session.step(&input).await {
            Ok((assistant, user)) => {
                if assistant.terminated || user.terminated {
                    tracing::info!(turn, "conversation terminated");
                    outcome.terminated = true;
                    break;
                }
                input = assistant.msg.clone();
                outcome.exchanges.push(Exchange { assistant, user });
            }
            Err(e) => {
                tracing::error!(turn, error = %e, "role-playing step failed");
                outcome.error = Some(e.to_string());
                break;
            }
        }
    }

    outcome
}

/// Product manager instructing a senior architect for three turns.
pub async fn single_session_demo(
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
    events: Arc<EventBus>,
) -> crate::Result<SessionOutcome> {
    events.publish(OrchestrationEvent::RunStarted {
        run: "role-play".into(),
        input: SINGLE_TASK.into(),
    });

    let config = RolePlayingConfig::new("高级软件架构师", "技术产品经理", SINGLE_TASK)
        .with_options(options);
    let mut session = RolePlaying::new(config, provider, Some(events.clone())).await?;
    let outcome = run_session(&mut session, 3).await;

    publish_finished(&events, "role-play", std::slice::from_ref(&outcome));
    Ok(outcome)
}

/// Three consecutive sessions handing the work down the team, four turns each.
pub async fn relay_demo(
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
    events: Arc<EventBus>,
) -> crate::Result<Vec<SessionOutcome>> {
    events.publish(OrchestrationEvent::RunStarted {
        run: "role-play-relay".into(),
        input: RELAY_TASK.into(),
    });

    let mut outcomes = Vec::with_capacity(RELAY_LEGS.len());
    for (leg, (assistant_role, user_role, task)) in RELAY_LEGS.iter().enumerate() {
        tracing::info!(leg = leg + 1, assistant = %assistant_role, user = %user_role, "starting relay leg");
        let config =
            RolePlayingConfig::new(*assistant_role, *user_role, *task).with_options(options.clone());
        let mut session = RolePlaying::new(config, provider.clone(), Some(events.clone())).await?;
        outcomes.push(run_session(&mut session, 4).await);
    }

    publish_finished(&events, "role-play-relay", &outcomes);
    Ok(outcomes)
}

fn publish_finished(events: &EventBus, run: &str, outcomes: &[SessionOutcome]) {
    match outcomes.iter().find_map(|o| o.error.clone()) {
        Some(error) => events.publish(OrchestrationEvent::RunFailed {
            run: run.to_string(),
            error,
        }),
        None => {
            let turns: usize = outcomes.iter().map(|o| o.exchanges.len()).sum();
            events.publish(OrchestrationEvent::RunCompleted {
                run: run.to_string(),
                summary: format!("{} session(s), {} exchange(s)", outcomes.len(), turns),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProvider;

    #[tokio::test]
    async fn test_run_session_feeds_assistant_reply_forward() {
        let provider = ScriptedProvider::new([
            "Instruction: one",
            "Solution: first",
            "Instruction: two",
            "Solution: second",
        ]);
        let mut session = RolePlaying::new(
            RolePlayingConfig::new("A", "U", "t").with_task_specify(false),
            Arc::new(provider.clone()),
            None,
        )
        .await
        .unwrap();

        let outcome = run_session(&mut session, 2).await;
        assert_eq!(outcome.exchanges.len(), 2);
        assert!(!outcome.terminated);

        // third request is the user role's second turn, answering "Solution: first"
        let third = &provider.requests()[2].messages;
        assert_eq!(third.last().unwrap().content, "Solution: first");
    }

    #[tokio::test]
    async fn test_run_session_stops_on_error() {
        let provider = ScriptedProvider::new(["Instruction: one"]).then_fail("boom");
        let mut session = RolePlaying::new(
            RolePlayingConfig::new("A", "U", "t").with_task_specify(false),
            Arc::new(provider),
            None,
        )
        .await
        .unwrap();

        let outcome = run_session(&mut session, 3).await;
        assert!(outcome.exchanges.is_empty());
        assert!(outcome.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_relay_runs_three_legs() {
        // specifier + 4 x (user, assistant) per leg
        let provider = ScriptedProvider::default().with_fallback("Solution: ok");
        let outcomes = relay_demo(
            Arc::new(provider.clone()),
            GenerateOptions::default(),
            Arc::new(EventBus::default()),
        )
        .await
        .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.exchanges.len() == 4));
        assert_eq!(outcomes[1].assistant_role, "开发工程师");
        assert_eq!(provider.call_count(), 3 * (1 + 4 * 2));
    }
}
