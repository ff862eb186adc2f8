//! The demo teams run against a scripted model.

use agent_orchestra::crew::Team;
use agent_orchestra::events::{EventBus, OrchestrationEvent};
use agent_orchestra::group_chat::{blog_team, ScriptedInput, BLOG_TASK};
use agent_orchestra::provider::{GenerateOptions, ScriptedProvider};
use agent_orchestra::society::{single_session_demo, SINGLE_TASK};
use agent_orchestra::workflows::supervisor::{SupervisorTeam, DEMO_TASK};
use std::sync::Arc;
use tokio::sync::broadcast;

fn drain(rx: &mut broadcast::Receiver<OrchestrationEvent>) -> Vec<OrchestrationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn agent_messages(events: &[OrchestrationEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            OrchestrationEvent::AgentMessage { agent, .. } => Some(agent.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_supervisor_team_runs_every_role_once() {
    let provider = ScriptedProvider::new(["需求文档", "架构方案", "实现方案", "测试报告"]);
    let events = Arc::new(EventBus::new(128));
    let mut rx = events.subscribe();

    let team = SupervisorTeam::new(
        Arc::new(provider.clone()),
        GenerateOptions::with_temperature(0.7),
        events,
    )
    .unwrap();
    let state = team.run(DEMO_TASK).await.unwrap();

    assert_eq!(state.iteration, 4);
    assert_eq!(state.current_agent, "tester");
    assert_eq!(state.messages.len(), 5);
    assert!(state.final_result.contains("多智能体协作完成报告"));
    assert!(state.final_result.contains("需求文档\n\n架构方案\n\n实现方案\n\n测试报告"));

    // the tester sees every earlier turn
    let last = &provider.requests()[3].messages;
    assert!(last.iter().any(|m| m.content == "架构方案"));

    let speakers = agent_messages(&drain(&mut rx));
    assert_eq!(
        speakers,
        vec!["PRODUCT_MANAGER", "ARCHITECT", "DEVELOPER", "TESTER"]
    );
}

#[tokio::test]
async fn test_development_crew_uses_architect_tool() {
    let provider = ScriptedProvider::new([
        "需求文档 v1",
        r#"{"tool_calls": [{"id": "call_1", "name": "生成架构文档", "parameters": {"architecture": "微服务"}}]}"#,
        "架构设计完成",
        "核心代码",
        "测试方案",
    ]);
    let events = Arc::new(EventBus::new(128));
    let mut rx = events.subscribe();

    let crew = Team::Development
        .crew()
        .provider(Arc::new(provider.clone()))
        .options(GenerateOptions::default())
        .events(events)
        .build()
        .unwrap();
    let output = crew.kickoff().await.unwrap();

    assert_eq!(output.raw, "测试方案");
    let raws: Vec<_> = output.tasks_output.iter().map(|t| t.raw.as_str()).collect();
    assert_eq!(raws, vec!["需求文档 v1", "架构设计完成", "核心代码", "测试方案"]);

    // the architect's follow-up request carries the tool result
    let follow_up = &provider.requests()[2].messages;
    assert!(follow_up
        .last()
        .unwrap()
        .content
        .contains("Result 1: 已生成架构文档，包含：微服务"));

    let events = drain(&mut rx);
    let tool_runs = events
        .iter()
        .filter(|e| matches!(e, OrchestrationEvent::ToolCallCompleted { .. }))
        .count();
    let tasks_done = events
        .iter()
        .filter(|e| matches!(e, OrchestrationEvent::TaskCompleted { .. }))
        .count();
    assert_eq!(tool_runs, 1);
    assert_eq!(tasks_done, 4);
}

#[tokio::test]
async fn test_role_play_stops_on_task_done() {
    let provider = ScriptedProvider::new([
        "设计一个支持横向扩展的多智能体平台架构。",
        "Instruction: 给出整体架构\nInput: None",
        "Solution: 分层架构。Next request.",
        "<TASK_DONE>",
    ]);
    let events = Arc::new(EventBus::new(128));
    let mut rx = events.subscribe();

    let outcome = single_session_demo(
        Arc::new(provider.clone()),
        GenerateOptions::default(),
        events,
    )
    .await
    .unwrap();

    assert!(outcome.terminated);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.assistant_role, "高级软件架构师");
    assert_eq!(outcome.exchanges.len(), 1);
    assert_eq!(provider.call_count(), 4);

    let specify = &provider.requests()[0].messages;
    assert!(specify.last().unwrap().content.contains(SINGLE_TASK));

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, OrchestrationEvent::RunCompleted { run, .. } if run == "role-play")));
}

#[tokio::test]
async fn test_blog_team_stops_after_three_messages() {
    let provider = ScriptedProvider::new(["- 引言\n- 案例\n- 总结"]);
    let events = Arc::new(EventBus::new(32));
    let mut rx = events.subscribe();

    let mut team = blog_team(
        Arc::new(provider.clone()),
        GenerateOptions::default(),
        Box::new(ScriptedInput::new(["请开始"])),
        events,
    )
    .unwrap();
    let result = team.run(BLOG_TASK).await.unwrap();

    let sources: Vec<_> = result.messages.iter().map(|m| m.source.as_str()).collect();
    assert_eq!(sources, vec!["user", "User", "PlannerAgent"]);
    assert_eq!(
        result.stop_reason.as_deref(),
        Some("Maximum number of messages 3 reached, current message count: 3")
    );
    assert_eq!(provider.call_count(), 1);
    assert_eq!(agent_messages(&drain(&mut rx)), vec!["user", "User", "PlannerAgent"]);
}
