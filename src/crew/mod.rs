//! Crew of role-defined agents working through a task list.

mod agent;
#[allow(clippy::module_inception)]
mod crew;
pub mod presets;
mod task;
pub mod tools;

pub use agent::CrewAgent;
pub use crew::{Crew, CrewBuilder, CrewOutput, Process};
pub use presets::Team;
pub use task::{Task, TaskOutput};
