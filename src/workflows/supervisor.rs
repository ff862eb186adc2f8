//! Supervisor-routed team: product manager, architect, developer and tester
//! take one turn each over a shared message history, then a finalize node
//! writes the completion report.

use crate::error::Result;
use crate::events::{EventBus, OrchestrationEvent};
use crate::graph::{CompiledGraph, GraphState, StateGraph, END};
use crate::provider::{GenerateOptions, LlmProvider, Message};
use std::sync::Arc;

pub const PRODUCT_MANAGER: &str = "product_manager";
pub const ARCHITECT: &str = "architect";
pub const DEVELOPER: &str = "developer";
pub const TESTER: &str = "tester";
pub const FINALIZE: &str = "finalize";

const ROUTE_END: &str = "end";

pub const DEMO_TASK: &str = "
    设计并开发一个在线待办事项管理系统，需要包含以下功能：
    1. 用户注册和登录
    2. 创建、编辑、删除待办事项
    3. 待办事项的分类和优先级设置
    4. 任务完成状态跟踪
    5. 数据持久化存储

    请各智能体协作完成从需求分析到测试的完整流程。
    ";

const CLOSING_INSTRUCTION: &str = "请根据你的角色职责，基于上述信息提供专业的分析和建议。";

pub fn role_prompt(agent: &str) -> &'static str {
    match agent {
        PRODUCT_MANAGER => "你是一位经验丰富的产品经理。你的职责是：
1. 分析用户需求，明确产品功能
2. 定义产品规格和验收标准
3. 与架构师协作，确保需求的技术可行性
4. 输出清晰、可执行的产品需求文档

请用中文回复，保持专业和清晰。",
        ARCHITECT => "你是一位资深的技术架构师。你的职责是：
1. 根据产品需求设计技术架构
2. 选择合适的技术栈和框架
3. 定义系统模块和接口规范
4. 与开发工程师协作，确保架构的可实现性

请用中文回复，提供详细的技术方案。",
        DEVELOPER => "你是一位优秀的开发工程师。你的职责是：
1. 根据架构设计实现具体功能
2. 编写高质量的代码
3. 进行单元测试和代码审查
4. 与测试工程师协作，确保代码质量

请用中文回复，提供具体的实现方案。",
        TESTER => "你是一位专业的测试工程师。你的职责是：
1. 设计测试用例和测试策略
2. 执行功能测试和集成测试
3. 发现和报告缺陷
4. 确保产品质量符合标准

请用中文回复，提供详细的测试报告。",
        _ => "",
    }
}

#[derive(Debug, Clone, Default)]
pub struct SupervisorState {
    pub messages: Vec<Message>,
    pub current_agent: String,
    pub task: String,
    pub iteration: u32,
    pub final_result: String,
}

/// Partial state written by one node. `messages` are appended, every other
/// field overwrites when present.
#[derive(Debug, Clone, Default)]
pub struct SupervisorUpdate {
    pub messages: Vec<Message>,
    pub current_agent: Option<String>,
    pub iteration: Option<u32>,
    pub final_result: Option<String>,
}

impl GraphState for SupervisorState {
    type Update = SupervisorUpdate;

    fn apply(&mut self, update: SupervisorUpdate) {
        self.messages.extend(update.messages);
        if let Some(agent) = update.current_agent {
            self.current_agent = agent;
        }
        if let Some(iteration) = update.iteration {
            self.iteration = iteration;
        }
        if let Some(result) = update.final_result {
            self.final_result = result;
        }
    }
}

/// Next agent after `current_agent`; `"end"` once the tester has spoken.
pub fn supervisor(state: &SupervisorState) -> String {
    let next = match state.current_agent.as_str() {
        "" => PRODUCT_MANAGER,
        PRODUCT_MANAGER => ARCHITECT,
        ARCHITECT => DEVELOPER,
        DEVELOPER => TESTER,
        _ => ROUTE_END,
    };
    next.to_string()
}

/// Messages sent to the model for one agent turn.
pub fn agent_messages(agent: &str, state: &SupervisorState) -> Vec<Message> {
    let mut messages = vec![Message::system(role_prompt(agent))];
    if !state.task.is_empty() {
        messages.push(Message::user(format!("任务描述：{}", state.task)));
    }
    messages.extend(state.messages.iter().cloned());
    messages.push(Message::user(CLOSING_INSTRUCTION));
    messages
}

async fn agent_turn(
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
    agent: &'static str,
    state: SupervisorState,
) -> Result<SupervisorUpdate> {
    let response = provider
        .generate(agent_messages(agent, &state), Some(options))
        .await?;
    Ok(SupervisorUpdate {
        messages: vec![Message::assistant(response.content)],
        current_agent: Some(agent.to_string()),
        iteration: Some(state.iteration + 1),
        final_result: None,
    })
}

pub fn completion_report(state: &SupervisorState) -> String {
    let summary = state
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let task = if state.task.is_empty() {
        "未指定"
    } else {
        state.task.as_str()
    };

    format!(
        "多智能体协作完成报告\n========================\n\n任务：{task}\n\n协作流程：\n{summary}\n\n所有智能体已完成各自的工作，项目可以进入下一阶段。\n"
    )
}

pub struct SupervisorTeam {
    graph: CompiledGraph<SupervisorState>,
    events: Arc<EventBus>,
}

impl SupervisorTeam {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        options: GenerateOptions,
        events: Arc<EventBus>,
    ) -> Result<Self> {
        let mut graph = StateGraph::new("supervisor");

        for agent in [PRODUCT_MANAGER, ARCHITECT, DEVELOPER, TESTER] {
            let provider = provider.clone();
            let options = options.clone();
            graph.add_node(agent, move |state: SupervisorState| {
                agent_turn(provider.clone(), options.clone(), agent, state)
            });
        }

        graph.add_node(FINALIZE, |state: SupervisorState| async move {
            let report = completion_report(&state);
            Ok(SupervisorUpdate {
                messages: vec![Message::assistant(report.clone())],
                final_result: Some(report),
                ..Default::default()
            })
        });

        graph
            .set_entry_point(PRODUCT_MANAGER)
            .add_conditional_edges(
                PRODUCT_MANAGER,
                supervisor,
                [(ARCHITECT, ARCHITECT), (ROUTE_END, FINALIZE)],
            )
            .add_conditional_edges(
                ARCHITECT,
                supervisor,
                [(DEVELOPER, DEVELOPER), (ROUTE_END, FINALIZE)],
            )
            .add_conditional_edges(
                DEVELOPER,
                supervisor,
                [(TESTER, TESTER), (ROUTE_END, FINALIZE)],
            )
            .add_conditional_edges(TESTER, supervisor, [(ROUTE_END, FINALIZE)])
            .add_edge(FINALIZE, END);

        Ok(Self {
            graph: graph.compile()?.with_events(events.clone()),
            events,
        })
    }

    /// Run the team on `task`, publishing each agent's turn as it lands.
    pub async fn run(&self, task: &str) -> Result<SupervisorState> {
        self.events.publish(OrchestrationEvent::RunStarted {
            run: "supervisor".into(),
            input: task.to_string(),
        });

        let initial = SupervisorState {
            task: task.to_string(),
            ..Default::default()
        };

        let mut steps = self.graph.stream(initial);
        let mut last = None;
        while let Some(step) = steps.recv().await {
            let (node, state) = match step {
                Ok(step) => step,
                Err(e) => {
                    self.events.publish(OrchestrationEvent::RunFailed {
                        run: "supervisor".into(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            };
            if node != FINALIZE {
                if let Some(message) = state.messages.last() {
                    self.events.publish(OrchestrationEvent::AgentMessage {
                        agent: state.current_agent.to_uppercase(),
                        content: message.content.clone(),
                    });
                }
            }
            last = Some(state);
        }

        let state = last.unwrap_or_default();
        self.events.publish(OrchestrationEvent::RunCompleted {
            run: "supervisor".into(),
            summary: state.final_result.clone(),
        });
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supervisor_routing() {
        let mut state = SupervisorState::default();
        let mut order = Vec::new();
        loop {
            let next = supervisor(&state);
            if next == ROUTE_END {
                break;
            }
            order.push(next.clone());
            state.current_agent = next;
        }
        assert_eq!(order, vec![PRODUCT_MANAGER, ARCHITECT, DEVELOPER, TESTER]);
        state.current_agent = "someone_else".into();
        assert_eq!(supervisor(&state), ROUTE_END);
    }

    #[test]
    fn test_agent_messages_layout() {
        let state = SupervisorState {
            task: "build it".into(),
            messages: vec![Message::assistant("prd")],
            ..Default::default()
        };
        let messages = agent_messages(ARCHITECT, &state);
        assert_eq!(messages.len(), 4);
        assert!(messages[0].content.starts_with("你是一位资深的技术架构师"));
        assert_eq!(messages[1], Message::user("任务描述：build it"));
        assert_eq!(messages[2], Message::assistant("prd"));
        assert_eq!(messages[3], Message::user(CLOSING_INSTRUCTION));
    }

    #[test]
    fn test_agent_messages_without_task() {
        let messages = agent_messages(TESTER, &SupervisorState::default());
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_completion_report() {
        let state = SupervisorState {
            messages: vec![Message::assistant("a"), Message::assistant("b")],
            ..Default::default()
        };
        let report = completion_report(&state);
        assert!(report.contains("任务：未指定"));
        assert!(report.contains("协作流程：\na\n\nb\n"));
    }
}
