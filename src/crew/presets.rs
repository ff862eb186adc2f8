//! The three demo crews: research, development and content creation.

use super::agent::CrewAgent;
use super::crew::{Crew, CrewBuilder, Process};
use super::task::Task;
use super::tools::{analyze_technical_requirements, generate_architecture_doc};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Team {
    Research,
    #[default]
    Development,
    Content,
}

impl FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "research" => Ok(Team::Research),
            "2" | "development" | "" => Ok(Team::Development),
            "3" | "content" => Ok(Team::Content),
            other => Err(format!("unknown team: {}", other)),
        }
    }
}

impl Team {
    pub fn label(&self) -> &'static str {
        match self {
            Team::Research => "研究型团队",
            Team::Development => "开发型团队",
            Team::Content => "内容创作团队",
        }
    }

    /// Crew preloaded with this team's members and tasks; the caller
    /// supplies provider, options and events before `build`.
    pub fn crew(&self) -> CrewBuilder {
        match self {
            Team::Research => research_crew(),
            Team::Development => development_crew(),
            Team::Content => content_creation_crew(),
        }
    }
}

pub fn research_crew() -> CrewBuilder {
    let researcher = CrewAgent::new(
        "技术研究员",
        "深入调研和分析技术趋势，提供准确的技术信息",
        "你是一位经验丰富的技术研究员，拥有10年的技术调研经验。你擅长从多个角度分析技术问题，能够快速找到可靠的技术资料和最佳实践。你的研究报告总是结构清晰、数据详实、结论明确。",
    )
    .verbose(true);

    let analyst = CrewAgent::new(
        "技术分析师",
        "分析技术方案的可行性和优劣，提供专业建议",
        "你是一位资深的技术分析师，擅长评估技术方案的优缺点。你能够从性能、成本、可维护性、可扩展性等多个维度进行综合分析。你的分析报告总是客观、全面、具有可操作性。",
    )
    .verbose(true);

    let research_task = Task::new(
        "调研多智能体系统的技术架构方案。需要涵盖：1）主流的多智能体框架对比；2）通信机制和协调策略；3）关键技术选型建议；4）实际应用案例。请提供详细的技术调研报告。",
        "一份结构化的技术调研报告，包含框架对比、技术选型建议和应用案例",
        &researcher.role,
    );

    let analysis_task = Task::new(
        "基于研究员提供的技术调研报告，进行深入分析。评估不同技术方案的优劣，给出推荐方案和理由。分析应该包括：性能对比、实施难度、维护成本等维度。",
        "一份技术分析报告，包含方案对比、评估结果和推荐建议",
        &analyst.role,
    );

    Crew::builder()
        .name("research-crew")
        .agent(researcher)
        .agent(analyst)
        .task(research_task)
        .task(analysis_task)
        .process(Process::Sequential)
}

pub fn development_crew() -> CrewBuilder {
    let product_manager = CrewAgent::new(
        "产品经理",
        "明确产品需求，定义功能规格，协调开发进度",
        "你是一位经验丰富的产品经理，擅长将业务需求转化为清晰的技术需求。你能够与技术人员有效沟通，平衡用户需求和开发成本。你的需求文档总是详细、准确、可执行。",
    )
    .verbose(true)
    .allow_delegation(true);

    let architect = CrewAgent::new(
        "系统架构师",
        "设计系统架构，制定技术方案，确保系统的可扩展性和可维护性",
        "你是一位资深系统架构师，拥有15年的架构设计经验。你熟悉各种架构模式，能够设计出既满足当前需求又具备良好扩展性的系统。你的架构设计总是考虑全面、文档清晰、易于实现。",
    )
    .verbose(true)
    .allow_delegation(true)
    .with_tool(analyze_technical_requirements())
    .with_tool(generate_architecture_doc());

    let developer = CrewAgent::new(
        "高级开发工程师",
        "实现功能模块，编写高质量代码，确保代码的可维护性",
        "你是一位高级开发工程师，精通多种编程语言和开发框架。你编写的代码总是结构清晰、注释完善、遵循最佳实践。你能够快速理解架构设计并高效实现功能。",
    )
    .verbose(true);

    let tester = CrewAgent::new(
        "测试工程师",
        "设计测试策略，编写测试用例，确保产品质量",
        "你是一位专业的测试工程师，擅长设计全面的测试方案。你能够从功能、性能、安全等多个维度进行测试设计。你的测试用例总是覆盖全面、边界清晰、易于执行。",
    )
    .verbose(true);

    let requirement_task = Task::new(
        "作为产品经理，分析并定义多智能体协作平台的核心需求。需求应该包括：1）核心功能列表；2）用户场景描述；3）非功能需求（性能、可用性等）；4）优先级排序。输出详细的产品需求文档。",
        "一份完整的产品需求文档，包含功能需求、非功能需求和优先级",
        &product_manager.role,
    );

    let architecture_task = Task::new(
        "基于产品经理提供的需求文档，设计系统技术架构。架构设计应该包括：1）系统整体架构图（文字描述）；2）核心模块划分；3）技术栈选型；4）数据流和通信机制；5）部署方案。使用提供的工具生成架构文档。",
        "一份完整的系统架构设计文档，包含架构图、模块设计和技术选型",
        &architect.role,
    );

    let development_task = Task::new(
        "基于架构师提供的架构设计，实现核心功能模块。需要实现：1）智能体管理模块；2）任务分配和协调模块；3）通信机制模块。提供代码实现方案和关键代码片段。",
        "功能实现方案和关键代码，包含模块设计和代码示例",
        &developer.role,
    );

    let testing_task = Task::new(
        "基于开发工程师提供的功能实现，设计完整的测试方案。测试方案应该包括：1）单元测试策略；2）集成测试策略；3）性能测试方案；4）测试用例示例。",
        "一份完整的测试方案文档，包含测试策略和测试用例",
        &tester.role,
    );

    Crew::builder()
        .name("development-crew")
        .agent(product_manager)
        .agent(architect)
        .agent(developer)
        .agent(tester)
        .task(requirement_task)
        .task(architecture_task)
        .task(development_task)
        .task(testing_task)
        .process(Process::Sequential)
}

pub fn content_creation_crew() -> CrewBuilder {
    let writer = CrewAgent::new(
        "技术写作者",
        "撰写高质量的技术文章，内容准确、结构清晰、易于理解",
        "你是一位资深技术写作者，擅长将复杂的技术概念转化为通俗易懂的文章。你的文章总是结构清晰、逻辑严密、案例丰富。你能够根据目标受众调整写作风格和深度。",
    )
    .verbose(true);

    let editor = CrewAgent::new(
        "技术编辑",
        "审阅和优化文章内容，确保质量、准确性和可读性",
        "你是一位严格的技术编辑，对文章质量要求极高。你能够发现文章中的逻辑问题、表述不清和错误信息。你的修改建议总是具体、可操作、能够显著提升文章质量。",
    )
    .verbose(true);

    let reviewer = CrewAgent::new(
        "技术评审员",
        "从技术准确性角度评审文章，确保技术内容的正确性",
        "你是一位技术专家，拥有深厚的技术背景。你能够识别文章中的技术错误、过时信息和不准确表述。你的评审意见总是专业、准确、有助于提升文章的技术质量。",
    )
    .verbose(true);

    let writing_task = Task::new(
        "撰写一篇关于\"多智能体系统在软件开发中的应用\"的技术文章。文章要求：1）字数约800-1000字；2）包含引言、正文（至少3个小节）、总结；3）正文中至少包含2个实际应用案例；4）面向技术开发人员，风格专业但易懂。",
        "一篇完整的技术文章初稿，包含引言、正文和总结",
        &writer.role,
    );

    let editing_task = Task::new(
        "审阅写作者提供的文章初稿，从结构和可读性角度进行优化。检查：1）文章结构是否清晰；2）段落逻辑是否连贯；3）表述是否清晰易懂；4）是否有冗余或缺失内容。提供修改建议和优化后的版本。",
        "优化后的文章版本和详细的修改说明",
        &editor.role,
    );

    let review_task = Task::new(
        "从技术准确性角度评审编辑后的文章。检查：1）技术概念是否准确；2）案例是否真实可靠；3）技术细节是否正确；4）是否有过时或错误信息。提供技术评审意见和最终版本。",
        "技术评审报告和最终定稿的文章",
        &reviewer.role,
    );

    Crew::builder()
        .name("content-crew")
        .agent(writer)
        .agent(editor)
        .agent(reviewer)
        .task(writing_task)
        .task(editing_task)
        .task(review_task)
        .process(Process::Sequential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProvider;
    use std::sync::Arc;

    #[test]
    fn test_team_parsing() {
        assert_eq!("research".parse::<Team>(), Ok(Team::Research));
        assert_eq!("".parse::<Team>(), Ok(Team::Development));
        assert_eq!("3".parse::<Team>(), Ok(Team::Content));
        assert!("ops".parse::<Team>().is_err());
    }

    #[test]
    fn test_presets_build() {
        for (team, agents, tasks) in [
            (Team::Research, 2, 2),
            (Team::Development, 4, 4),
            (Team::Content, 3, 3),
        ] {
            let crew = team
                .crew()
                .provider(Arc::new(ScriptedProvider::default()))
                .build()
                .unwrap();
            assert_eq!(crew.agents().len(), agents);
            assert_eq!(crew.tasks().len(), tasks);
        }
    }

    #[test]
    fn test_architect_carries_tools() {
        let crew = development_crew()
            .provider(Arc::new(ScriptedProvider::default()))
            .build()
            .unwrap();
        let architect = &crew.agents()[1];
        assert!(architect.allow_delegation);
        let names: Vec<_> = architect.tools.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["分析技术需求", "生成架构文档"]);
    }
}
