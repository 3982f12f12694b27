use agent_relay_model::ModelProvider;

use super::Agent;
use crate::model_client::ModelClient;
use crate::tool::{Tool, ToolSet};
use crate::{Error, Result};

/// [`Agent`] builder.
#[derive(Debug)]
pub struct AgentBuilder {
    model_client: ModelClient,
    name: Option<String>,
    instruction: String,
    tools: ToolSet,
    tool_choice: Option<String>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            name: None,
            instruction: String::new(),
            tools: ToolSet::default(),
            tool_choice: None,
        }
    }

    /// Sets the name, which identifies the agent in an orchestrator.
    #[inline]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the instruction (system prompt).
    #[inline]
    pub fn with_instruction<S: Into<String>>(
        mut self,
        instruction: S,
    ) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add_tool(tool);
        self
    }

    /// Replaces all registered tools.
    #[inline]
    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    /// Makes the model prefer the named tool.
    #[inline]
    pub fn with_tool_choice<S: Into<String>>(mut self, name: S) -> Self {
        self.tool_choice = Some(name.into());
        self
    }

    /// Builds the agent.
    ///
    /// Fails if the name is missing or blank, a tool is not invocable, or
    /// the tool choice names an unknown tool.
    pub fn build(self) -> Result<Agent> {
        let Self {
            model_client,
            name,
            instruction,
            tools,
            tool_choice,
        } = self;

        let Some(name) = name.filter(|name| !name.trim().is_empty()) else {
            return Err(Error::InvalidAgent(
                "an agent requires a non-empty name".to_owned(),
            ));
        };
        let mut agent = Agent::new(name, instruction, model_client);
        agent.set_tools(tools)?;
        if let Some(tool_choice) = tool_choice {
            agent.set_tool_choice(tool_choice)?;
        }
        Ok(agent)
    }
}
