pub mod agent;
pub mod chat;
pub mod config;
pub mod crew;
pub mod error;
pub mod events;
pub mod extract;
pub mod graph;
pub mod group_chat;
pub mod hooks;
pub mod memory;
pub mod provider;
pub mod society;
pub mod tool;
pub mod workflows;

pub use agent::*;
pub use chat::{ChatAgent, ChatAgentResponse};
pub use config::Settings;
pub use error::{AgentError, Result};
pub use events::*;
pub use graph::{CompiledGraph, GraphError, GraphState, StateGraph, END};
pub use hooks::*;
pub use memory::Memory;
pub use provider::{
    GenerateOptions, GenerateResponse, LlmProvider, Message, OpenAiProvider, Role,
    ScriptedProvider, StreamResponse, Usage,
};
pub use tool::*;
