use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Task {
    pub description: String,
    pub expected_output: String,
    /// Role of the crew member that owns this task
    pub agent: String,
}

impl Task {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
        }
    }

    /// Prompt handed to the owning agent; `context` carries earlier outputs.
    pub fn prompt(&self, context: Option<&str>) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\nyou MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        );
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(context);
        }
        prompt.push_str("\n\nBegin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!");
        prompt
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub description: String,
    pub agent: String,
    pub raw: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_context() {
        let task = Task::new("Write docs", "A README", "writer");
        let prompt = task.prompt(None);
        assert!(prompt.starts_with("Current Task: Write docs"));
        assert!(prompt.contains("expected criteria for your final answer: A README"));
        assert!(!prompt.contains("context you're working with"));
    }

    #[test]
    fn test_prompt_with_context() {
        let task = Task::new("Review", "Notes", "editor");
        let prompt = task.prompt(Some("draft text"));
        assert!(prompt.contains("This is the context you're working with:\ndraft text"));
        assert_eq!(task.prompt(Some("")), task.prompt(None));
    }
}
