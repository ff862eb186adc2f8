#[allow(clippy::module_inception)]
mod agent;
mod options;

pub use agent::Agent;
pub use options::{AgentOptions, ToolChoice};
