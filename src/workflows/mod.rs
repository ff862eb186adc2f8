//! Graph-driven workflows built on [`crate::graph`].

pub mod email_template;
pub mod supervisor;
