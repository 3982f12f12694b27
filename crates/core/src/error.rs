use std::error::Error as StdError;

use agent_relay_model::{ErrorKind, ModelProviderError};
use thiserror::Error;

use crate::tool;

/// Errors surfaced by agents and the orchestrator.
///
/// Nothing is retried internally; every failure reaches the caller of
/// [`Orchestrator::run`](crate::Orchestrator::run) or
/// [`Agent::get_response`](crate::Agent::get_response) as-is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The agent cannot be built as configured.
    #[error("invalid agent: {0}")]
    InvalidAgent(String),

    /// A tool's parameter schema can't be turned into a calling signature.
    #[error("tool `{name}` is not invocable: {reason}")]
    InvalidTool {
        /// Name of the tool.
        name: String,
        /// What is wrong with the schema.
        reason: String,
    },

    /// A response was requested before the history was set.
    #[error("messages must be set before agent `{0}` can respond")]
    MessagesNotSet(String),

    /// No agent is registered under the name.
    #[error("no agent found with name: {0}")]
    AgentNotFound(String),

    /// The model called a tool the agent doesn't have.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The model sent arguments that aren't a JSON object.
    #[error("invalid arguments for tool `{name}`: {reason}")]
    InvalidArguments {
        /// Name of the called tool.
        name: String,
        /// Why decoding failed.
        reason: String,
    },

    /// A tool returned an error.
    #[error("tool `{name}` failed: {source}")]
    ToolFailed {
        /// Name of the failed tool.
        name: String,
        /// The tool's own error.
        #[source]
        source: tool::Error,
    },

    /// A tool delegated to an agent that is already running.
    #[error("cyclic delegation: {}", chain.join(" -> "))]
    DelegationCycle {
        /// Agent names from the outermost run to the repeated one.
        chain: Vec<String>,
    },

    /// Delegation went deeper than the orchestrator allows.
    #[error("delegation chain exceeds {0} levels")]
    DelegationTooDeep(usize),

    /// The backend failed.
    #[error("model provider error ({kind}): {source}")]
    Model {
        /// Kind reported by the provider.
        kind: ErrorKind,
        /// The provider's own error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    pub(crate) fn from_provider<E: ModelProviderError>(err: E) -> Self {
        Self::Model {
            kind: err.kind(),
            source: Box::new(err),
        }
    }

    /// Returns the provider error kind if this error came from a backend.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Model { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A specialized `Result` type for agent operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
