
use agent_relay_model::{
    AssistantMessage, ModelCompletion, ModelMessage, ToolCallRequest,
    ToolCallResult,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::model_client::ResponseStream;
use crate::tool::{ToolOutput, ToolSet};
use crate::{Agent, Error, Result};

/// The default limit of nested delegations in one run.
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 8;

/// A registry of agents that drives their turns.
///
/// A turn asks the agent for a response, and if the model calls tools,
/// runs them in the order they were requested and asks once more with the
/// results. A tool may hand the request over to another agent, which is
/// registered and run with the same user input. Its reply becomes the
/// tool result.
#[derive(Debug)]
pub struct Orchestrator {
    agents: Vec<Agent>,
    max_delegation_depth: usize,
}

impl Default for Orchestrator {
    #[inline]
    fn default() -> Self {
        Self {
            agents: vec![],
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }
}

impl Orchestrator {
    /// Creates an empty orchestrator.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits how many delegations may be nested in one run.
    #[inline]
    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    /// Registers an agent and returns it.
    ///
    /// The history is reset to a single assistant message carrying the
    /// instruction, and the tools are rendered by the agent's provider. An
    /// agent already registered under the same name is replaced.
    pub fn add_agent(&mut self, mut agent: Agent) -> &mut Agent {
        let instruction = agent.instruction().to_owned();
        agent.set_messages(vec![ModelMessage::assistant(instruction)]);
        agent.render_tools();

        let idx = match self.position(agent.name()) {
            Some(idx) => {
                debug!("replacing agent `{}`", agent.name());
                self.agents[idx] = agent;
                idx
            }
            None => {
                debug!("registering agent `{}`", agent.name());
                self.agents.push(agent);
                self.agents.len() - 1
            }
        };
        &mut self.agents[idx]
    }

    /// Returns the agent with the given name.
    #[inline]
    pub fn get_agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.name() == name)
    }

    /// Returns the agent with the given name mutably.
    #[inline]
    pub fn get_agent_mut(&mut self, name: &str) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| agent.name() == name)
    }

    /// Returns all registered agents, in registration order.
    #[inline]
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    #[inline]
    fn position(&self, name: &str) -> Option<usize> {
        self.agents.iter().position(|agent| agent.name() == name)
    }

    fn resolve(&mut self, name: &str) -> Result<&mut Agent> {
        self.get_agent_mut(name)
            .ok_or_else(|| Error::AgentNotFound(name.to_owned()))
    }

    /// Runs one turn of the named agent and returns the final response.
    ///
    /// A non-empty `input` is appended to the history as a user message
    /// first. Tool calls are resolved in a single pass: the response that
    /// follows the tool results is returned as-is, even if it calls tools
    /// again.
    pub async fn run(
        &mut self,
        name: &str,
        input: Option<&str>,
    ) -> Result<ModelCompletion> {
        let chain = vec![name.to_owned()];
        self.run_in_chain(name.to_owned(), input.map(ToOwned::to_owned), chain)
            .await
    }

    /// Like [`run`](Self::run), but streams the response of the agent.
    ///
    /// Tool calls in a streamed response are not dispatched.
    pub async fn run_stream(
        &mut self,
        name: &str,
        input: Option<&str>,
    ) -> Result<ResponseStream> {
        let agent = self.resolve(name)?;
        if let Some(input) = input.filter(|input| !input.is_empty()) {
            agent.push_message(ModelMessage::User(input.to_owned()));
        }
        agent.get_response_stream().await
    }

    // `chain` holds the names of the agents being run, outermost first,
    // ending with `name`.
    fn run_in_chain(
        &mut self,
        name: String,
        input: Option<String>,
        chain: Vec<String>,
    ) -> BoxFuture<'_, Result<ModelCompletion>> {
        let span = debug_span!("run agent", agent = %name);
        async move {
            let agent = self.resolve(&name)?;
            if let Some(input) = input.as_deref().filter(|i| !i.is_empty()) {
                agent.push_message(ModelMessage::User(input.to_owned()));
            }

            let completion = agent.get_response().await?;
            if !completion.has_tool_calls() {
                return Ok(completion);
            }

            let tools = agent.tools().clone();
            let mut messages = agent.messages().unwrap_or_default().to_vec();
            messages.push(ModelMessage::Assistant(AssistantMessage {
                content: Some(completion.content.unwrap_or_default()),
                tool_calls: completion.tool_calls.clone(),
            }));
            for call in completion.tool_calls {
                let content = self
                    .dispatch(&tools, &call, input.as_deref(), &chain)
                    .await?;
                messages.push(ModelMessage::Tool(ToolCallResult {
                    id: call.id,
                    content,
                }));
            }

            let agent = self.resolve(&name)?;
            agent.set_messages(messages);
            agent.get_response().await
        }
        .instrument(span)
        .boxed()
    }

    async fn dispatch(
        &mut self,
        tools: &ToolSet,
        call: &ToolCallRequest,
        input: Option<&str>,
        chain: &[String],
    ) -> Result<String> {
        let arguments = decode_arguments(call)?;
        let tool = tools
            .find(&call.name)
            .ok_or_else(|| Error::ToolNotFound(call.name.clone()))?;

        debug!("calling tool `{}` ({})", call.name, call.id);
        let output = tool.execute(arguments).await.map_err(|source| {
            warn!("tool `{}` failed: {source}", call.name);
            Error::ToolFailed {
                name: call.name.clone(),
                source,
            }
        })?;

        let delegate = match output {
            ToolOutput::Text(text) => return Ok(text),
            ToolOutput::Delegate(delegate) => delegate,
        };
        let delegate_name = delegate.name().to_owned();
        let mut chain = chain.to_vec();
        if chain.contains(&delegate_name) {
            chain.push(delegate_name);
            return Err(Error::DelegationCycle { chain });
        }
        if chain.len() > self.max_delegation_depth {
            return Err(Error::DelegationTooDeep(self.max_delegation_depth));
        }

        debug!("`{}` delegates to `{delegate_name}`", chain.join(" -> "));
        self.add_agent(delegate);
        chain.push(delegate_name.clone());
        let completion = self
            .run_in_chain(delegate_name, input.map(ToOwned::to_owned), chain)
            .await?;
        Ok(completion.content.unwrap_or_default())
    }
}

/// Decodes the argument text of a tool call into a JSON object.
///
/// Blank text is taken as no arguments.
fn decode_arguments(call: &ToolCallRequest) -> Result<Value> {
    if call.arguments.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let invalid = |reason: String| Error::InvalidArguments {
        name: call.name.clone(),
        reason,
    };
    match serde_json::from_str::<Value>(&call.arguments) {
        Ok(arguments @ Value::Object(_)) => Ok(arguments),
        Ok(_) => Err(invalid("arguments must be a JSON object".to_owned())),
        Err(err) => Err(invalid(format!("{err}"))),
    }
}
