mod builder;
#[cfg(test)]
mod tests;

use std::fmt::{self, Debug};

use agent_relay_model::{
    ModelCompletion, ModelMessage, ModelProvider, ModelRequest, ModelTool,
};
use serde_json::Value;

use crate::model_client::{ModelClient, ResponseStream};
use crate::tool::ToolSet;
use crate::{Error, Result};
pub use builder::AgentBuilder;

/// An agent, which binds a name, an instruction, a conversation history
/// and a tool set to one model provider.
///
/// An agent doesn't drive tool calls itself, it only asks its provider for
/// the next response. Register it to an [`Orchestrator`] to run turns
/// with tool dispatch and delegation.
///
/// [`Orchestrator`]: crate::Orchestrator
#[derive(Clone)]
pub struct Agent {
    name: String,
    instruction: String,
    messages: Option<Vec<ModelMessage>>,
    tools: ToolSet,
    signatures: Vec<ModelTool>,
    tool_choice: Option<String>,
    model_client: ModelClient,

    // Tool options rendered by the current provider, sent with every
    // request.
    rendered_tools: Vec<Value>,
    rendered_tool_choice: Option<Value>,
}

impl Agent {
    fn new(
        name: String,
        instruction: String,
        model_client: ModelClient,
    ) -> Self {
        Self {
            name,
            instruction,
            messages: None,
            tools: ToolSet::default(),
            signatures: vec![],
            tool_choice: None,
            model_client,
            rendered_tools: vec![],
            rendered_tool_choice: None,
        }
    }

    /// Returns the name of this agent.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instruction (system prompt) of this agent.
    #[inline]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Replaces the instruction.
    ///
    /// The history is left untouched, so a registered agent keeps the
    /// instruction it was seeded with until the messages are reset.
    #[inline]
    pub fn set_instruction<S: Into<String>>(&mut self, instruction: S) {
        self.instruction = instruction.into();
    }

    /// Returns the conversation history, or `None` if it was never set.
    #[inline]
    pub fn messages(&self) -> Option<&[ModelMessage]> {
        self.messages.as_deref()
    }

    /// Replaces the whole conversation history.
    #[inline]
    pub fn set_messages(&mut self, messages: Vec<ModelMessage>) {
        self.messages = Some(messages);
    }

    pub(crate) fn push_message(&mut self, message: ModelMessage) {
        self.messages.get_or_insert_default().push(message);
    }

    /// Returns the tools of this agent.
    #[inline]
    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Replaces the tool set, and renders every tool's calling signature
    /// through the provider.
    ///
    /// Fails if a tool's parameter schema is not an object schema, in which
    /// case the agent is left unchanged. A tool choice naming a tool that
    /// is no longer in the set is cleared.
    pub fn set_tools(&mut self, tools: ToolSet) -> Result<()> {
        self.signatures = tools.signatures()?;
        self.tools = tools;
        let stale_choice = self
            .tool_choice
            .as_deref()
            .is_some_and(|name| !self.tools.contains(name));
        if stale_choice {
            debug!("clearing tool choice of agent `{}`", self.name);
            self.tool_choice = None;
        }
        self.render_tools();
        Ok(())
    }

    /// Returns the name of the preferred tool, if any.
    #[inline]
    pub fn tool_choice(&self) -> Option<&str> {
        self.tool_choice.as_deref()
    }

    /// Makes the model prefer the named tool.
    ///
    /// Fails with [`Error::ToolNotFound`] if the agent has no such tool.
    pub fn set_tool_choice<S: Into<String>>(
        &mut self,
        name: S,
    ) -> Result<()> {
        let name = name.into();
        if !self.tools.contains(&name) {
            return Err(Error::ToolNotFound(name));
        }
        self.tool_choice = Some(name);
        self.render_tools();
        Ok(())
    }

    /// Lets the model pick tools on its own again.
    #[inline]
    pub fn clear_tool_choice(&mut self) {
        self.tool_choice = None;
        self.rendered_tool_choice = None;
    }

    /// Returns the client of the bound provider.
    #[inline]
    pub fn model_client(&self) -> &ModelClient {
        &self.model_client
    }

    /// Binds the agent to another provider. Tool options are rendered again
    /// in the new provider's shape.
    pub fn set_model_provider<P: ModelProvider + 'static>(
        &mut self,
        provider: P,
    ) {
        self.model_client = ModelClient::new(provider);
        self.render_tools();
    }

    /// Returns the tool declarations as the provider renders them.
    #[inline]
    pub fn rendered_tools(&self) -> &[Value] {
        &self.rendered_tools
    }

    pub(crate) fn render_tools(&mut self) {
        self.rendered_tools = self
            .signatures
            .iter()
            .map(|signature| self.model_client.format_tool(signature))
            .collect();
        self.rendered_tool_choice = self
            .tool_choice
            .as_ref()
            .and_then(|name| self.signatures.iter().find(|s| &s.name == name))
            .map(|signature| self.model_client.format_tool(signature));
    }

    fn request(&self) -> Result<ModelRequest> {
        let Some(messages) = &self.messages else {
            return Err(Error::MessagesNotSet(self.name.clone()));
        };
        Ok(ModelRequest {
            messages: messages.clone(),
            tools: self.rendered_tools.clone(),
            tool_choice: self.rendered_tool_choice.clone(),
        })
    }

    /// Asks the provider for a complete response to the current history.
    ///
    /// Fails with [`Error::MessagesNotSet`] before contacting the provider
    /// if the history was never set.
    pub async fn get_response(&self) -> Result<ModelCompletion> {
        let req = self.request()?;
        self.model_client.generate(&req).await
    }

    /// Like [`get_response`](Self::get_response), but returns the events
    /// as they arrive.
    pub async fn get_response_stream(&self) -> Result<ResponseStream> {
        let req = self.request()?;
        self.model_client.generate_stream(&req).await
    }
}

impl Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("instruction", &self.instruction)
            .field("messages", &self.messages)
            .field("tools", &self.tools)
            .field("tool_choice", &self.tool_choice)
            .finish_non_exhaustive()
    }
}
