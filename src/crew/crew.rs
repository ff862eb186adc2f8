use super::agent::CrewAgent;
use super::task::{Task, TaskOutput};
use super::tools::{DelegationKind, DelegationTool};
use crate::agent::{Agent, AgentOptions};
use crate::error::{AgentError, Result};
use crate::events::{EventBus, OrchestrationEvent};
use crate::provider::{GenerateOptions, LlmProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Process {
    /// Tasks run in declaration order; each sees all earlier outputs.
    #[default]
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewOutput {
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

pub struct Crew {
    name: String,
    agents: Vec<CrewAgent>,
    tasks: Vec<Task>,
    process: Process,
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
    events: Option<Arc<EventBus>>,
}

impl Crew {
    pub fn builder() -> CrewBuilder {
        CrewBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agents(&self) -> &[CrewAgent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub async fn kickoff(&self) -> Result<CrewOutput> {
        match self.process {
            Process::Sequential => self.run_sequential().await,
        }
    }

    async fn run_sequential(&self) -> Result<CrewOutput> {
        self.publish(OrchestrationEvent::RunStarted {
            run: self.name.clone(),
            input: format!("{} task(s)", self.tasks.len()),
        });

        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for task in &self.tasks {
            let context = outputs
                .iter()
                .map(|o| o.raw.as_str())
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR);

            let raw = match self.execute_task(task, &context).await {
                Ok(raw) => raw,
                Err(e) => {
                    self.publish(OrchestrationEvent::RunFailed {
                        run: self.name.clone(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            };

            tracing::info!(crew = %self.name, agent = %task.agent, "task completed");
            self.publish(OrchestrationEvent::TaskCompleted {
                task: task.description.clone(),
                agent: task.agent.clone(),
                output: raw.clone(),
            });

            outputs.push(TaskOutput {
                description: task.description.clone(),
                agent: task.agent.clone(),
                raw,
            });
        }

        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        self.publish(OrchestrationEvent::RunCompleted {
            run: self.name.clone(),
            summary: raw.clone(),
        });

        Ok(CrewOutput {
            raw,
            tasks_output: outputs,
        })
    }

    async fn execute_task(&self, task: &Task, context: &str) -> Result<String> {
        let member = self
            .agents
            .iter()
            .find(|a| a.role == task.agent)
            .ok_or_else(|| AgentError::config(format!("No crew member with role {}", task.agent)))?;

        if member.verbose {
            tracing::info!(agent = %member.role, task = %task.description, "working on task");
        }

        let mut agent = Agent::new(member.role.clone(), self.provider.clone()).with_options(
            AgentOptions::default()
                .with_system_prompt(member.system_prompt())
                .with_max_iterations(member.max_iterations)
                .with_generate_options(self.options.clone()),
        );
        if let Some(events) = &self.events {
            agent = agent.with_events(events.clone());
        }

        for tool in &member.tools {
            agent.register_tool(tool.clone()).await;
        }

        if member.allow_delegation {
            let coworkers: Vec<CrewAgent> = self
                .agents
                .iter()
                .filter(|a| a.role != member.role)
                .cloned()
                .collect();
            if !coworkers.is_empty() {
                for kind in [DelegationKind::DelegateWork, DelegationKind::AskQuestion] {
                    agent
                        .register_tool(Arc::new(DelegationTool::new(
                            kind,
                            coworkers.clone(),
                            self.provider.clone(),
                            self.options.clone(),
                        )))
                        .await;
                }
            }
        }

        let context = (!context.is_empty()).then_some(context);
        agent.run(&task.prompt(context)).await
    }

    fn publish(&self, event: OrchestrationEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

#[derive(Default)]
pub struct CrewBuilder {
    name: Option<String>,
    agents: Vec<CrewAgent>,
    tasks: Vec<Task>,
    process: Process,
    provider: Option<Arc<dyn LlmProvider>>,
    options: GenerateOptions,
    events: Option<Arc<EventBus>>,
}

impl CrewBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn agent(mut self, agent: CrewAgent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Every task must name a member of the crew.
    pub fn build(self) -> Result<Crew> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::config("Crew requires a provider"))?;

        if let Some(task) = self
            .tasks
            .iter()
            .find(|t| !self.agents.iter().any(|a| a.role == t.agent))
        {
            return Err(AgentError::config(format!(
                "Task '{}' is assigned to unknown agent {}",
                task.description, task.agent
            )));
        }

        Ok(Crew {
            name: self.name.unwrap_or_else(|| "crew".to_string()),
            agents: self.agents,
            tasks: self.tasks,
            process: self.process,
            provider,
            options: self.options,
            events: self.events,
        })
    }
}
