use agent_relay_core::{
    AgentBuilder, DEFAULT_MAX_DELEGATION_DEPTH, Orchestrator, ResponseStream,
    Result,
};
use agent_relay_model::{ModelCompletion, ModelProvider};

use crate::tools::*;

/// Name of the agent that receives the user's messages.
pub const ROUTER: &str = "router";
/// Name of the agent that the router delegates translations to.
pub const TRANSLATOR: &str = "translator";

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder<P> {
    model_provider: P,
    instruction: String,
    max_delegation_depth: usize,
}

impl<P: ModelProvider + Clone + 'static> SessionBuilder<P> {
    /// Creates a session builder with a specified model provider, shared
    /// by the router and the translator.
    pub fn with_model_provider(provider: P) -> Self {
        Self {
            model_provider: provider,
            instruction: String::new(),
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }

    /// Sets the instruction of the router agent.
    #[inline]
    pub fn with_instruction<S: Into<String>>(mut self, instruction: S) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Limits how many delegations may be nested in one message.
    #[inline]
    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    /// Builds a new session with the router registered.
    pub fn build(self) -> Result<Session> {
        let translator =
            AgentBuilder::with_model_provider(self.model_provider.clone())
                .with_name(TRANSLATOR)
                .build()?;
        let router = AgentBuilder::with_model_provider(self.model_provider)
            .with_name(ROUTER)
            .with_instruction(self.instruction)
            .with_tool(LookupWeatherTool::new())
            .with_tool(HandOffToTranslatorTool::new(translator))
            .build()?;

        let mut orchestrator = Orchestrator::new()
            .with_max_delegation_depth(self.max_delegation_depth);
        orchestrator.add_agent(router);
        Ok(Session { orchestrator })
    }
}

/// A chat session, like a window that displays messages and has a input box.
///
/// Messages go to the router agent, which may call tools or hand them off
/// before it replies. The session is basically a wrapper around an
/// [`Orchestrator`].
///
/// Every hand-off registers a fresh translator, so the translator keeps no
/// history across messages. Only the router remembers the conversation.
#[derive(Debug)]
pub struct Session {
    orchestrator: Orchestrator,
}

impl Session {
    /// Sends a user message to the router and returns its final reply.
    pub async fn send_message(
        &mut self,
        text: &str,
    ) -> Result<ModelCompletion> {
        self.orchestrator.run(ROUTER, Some(text)).await
    }

    /// Sends a user message to the router and streams its reply.
    ///
    /// Tool calls in a streamed reply are not dispatched.
    pub async fn send_message_stream(
        &mut self,
        text: &str,
    ) -> Result<ResponseStream> {
        self.orchestrator.run_stream(ROUTER, Some(text)).await
    }

    /// Returns the underlying orchestrator.
    #[inline]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}
