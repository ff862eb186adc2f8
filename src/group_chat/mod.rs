//! Round-robin group chat between model-backed assistants and a human proxy.

mod messages;
mod participants;
mod team;
mod termination;

pub use messages::{ChatMessage, TaskResult};
pub use participants::{
    AssistantAgent, Participant, ScriptedInput, StdinInput, UserInput, UserProxyAgent,
};
pub use team::{RoundRobinGroupChat, TASK_SOURCE};
pub use termination::{
    MaxMessageTermination, OrTermination, TerminationCondition, TextMentionTermination,
};

use crate::events::EventBus;
use crate::provider::{GenerateOptions, LlmProvider};
use std::sync::Arc;

pub const BLOG_TASK: &str = "请围绕'多智能体协作的应用场景'写一篇约 200 字的中文技术博客，要求：1）有引言、正文、总结结构；2）正文中给出 1 个实际案例；3）整体风格偏技术向、面向开发者。";

const PLANNER_SYSTEM: &str = "你是一名内容规划师。收到用户需求后，先用中文给出要写文章的大纲（项目符号列表），再根据大纲给 WriterAgent 提示，必要时回应 ReviewerAgent 的反馈。";
const WRITER_SYSTEM: &str = "你是一名中文技术写作者，擅长撰写结构清晰、内容深入的技术博客。输出时请包含：引言、正文（可分小节）、总结。";
const REVIEWER_SYSTEM: &str = "你是一名严格的技术编辑，负责审阅 WriterAgent 的草稿，检查逻辑性、结构性和表述清晰度，并给出具体修改建议（使用中文）。";

/// User, planner, writer and reviewer taking turns on `BLOG_TASK`; stops
/// after three messages or eight turns.
pub fn blog_team(
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
    input: Box<dyn UserInput>,
    events: Arc<EventBus>,
) -> crate::Result<RoundRobinGroupChat> {
    let assistant = |name: &str, system: &str| -> Box<dyn Participant> {
        Box::new(AssistantAgent::new(name, system, provider.clone()).with_options(options.clone()))
    };

    let team = RoundRobinGroupChat::new(vec![
        Box::new(UserProxyAgent::new("User", input)),
        assistant("PlannerAgent", PLANNER_SYSTEM),
        assistant("WriterAgent", WRITER_SYSTEM),
        assistant("ReviewerAgent", REVIEWER_SYSTEM),
    ])?
    .with_termination(MaxMessageTermination::new(3))
    .with_max_turns(8)
    .with_events(events);

    Ok(team)
}
