use crate::provider::GenerateOptions;

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub system_prompt: Option<String>,
    pub max_iterations: usize,
    pub tool_choice: ToolChoice,
    pub generate_options: GenerateOptions,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_iterations: 10,
            tool_choice: ToolChoice::Auto,
            generate_options: GenerateOptions::default(),
        }
    }
}

impl AgentOptions {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_generate_options(mut self, options: GenerateOptions) -> Self {
        self.generate_options = options;
        self
    }
}

/// Whether registered tools are advertised to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    None,
}
