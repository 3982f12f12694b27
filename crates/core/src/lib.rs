//! Core logic including agents, tools, and the orchestration loop that
//! dispatches tool calls and delegates between agents.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
mod error;
mod model_client;
mod orchestrator;
pub mod tool;

pub use agent::{Agent, AgentBuilder};
pub use error::{Error, Result};
pub use model_client::{ModelClient, ResponseStream};
pub use orchestrator::{DEFAULT_MAX_DELEGATION_DEPTH, Orchestrator};
pub use tool::{Tool, ToolOutput, ToolResult, ToolSet};
