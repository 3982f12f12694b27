//! Tool call supports.

mod error;
mod object;
mod set;

use std::fmt::{self, Debug};
use std::marker::PhantomData;

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Agent;
pub use error::{Error, ErrorKind};
pub use set::ToolSet;

/// The result of a tool call.
pub type ToolResult = Result<ToolOutput, Error>;

/// What a tool hands back to the orchestrator.
pub enum ToolOutput {
    /// Plain text, recorded as the tool message content.
    Text(String),
    /// Another agent that takes over the request. The orchestrator
    /// registers it, runs it with the same user input, and records its
    /// reply as the tool message content.
    Delegate(Agent),
}

impl ToolOutput {
    /// Returns the text if this is a [`ToolOutput::Text`].
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolOutput::Text(text) => Some(text),
            ToolOutput::Delegate(_) => None,
        }
    }
}

impl Debug for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolOutput::Text(text) => {
                f.debug_tuple("Text").field(text).finish()
            }
            ToolOutput::Delegate(agent) => {
                f.debug_tuple("Delegate").field(&agent.name()).finish()
            }
        }
    }
}

impl From<String> for ToolOutput {
    #[inline]
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ToolOutput {
    #[inline]
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Agent> for ToolOutput {
    #[inline]
    fn from(agent: Agent) -> Self {
        Self::Delegate(agent)
    }
}

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain
/// any internal state.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    ///
    /// Arguments from the model are deserialized into this type before the
    /// tool runs, so a mismatch is reported as
    /// [`ErrorKind::InvalidInput`] without executing anything.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    ///
    /// It must be an object schema, whose `properties` and `required`
    /// fields become the calling signature.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of
    /// `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// A tool backed by a closure. See [`from_fn`].
pub struct FnTool<I, F> {
    name: String,
    description: String,
    parameter_schema: Value,
    f: F,
    _input: PhantomData<fn(I)>,
}

/// Creates a tool from a closure.
///
/// The parameter schema is generated from the input type, so field docs
/// and `#[schemars(description = "...")]` attributes reach the model.
///
/// ```
/// use agent_relay_core::tool::{self, ToolOutput, ToolResult};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct Lookup {
///     city: String,
/// }
///
/// let lookup = tool::from_fn(
///     "lookup",
///     "Looks up the weather of a city.",
///     |input: Lookup| async move {
///         let text = format!("Sunny in {}", input.city);
///         ToolResult::Ok(ToolOutput::from(text))
///     },
/// );
/// ```
pub fn from_fn<I, F, Fut>(
    name: impl Into<String>,
    description: impl Into<String>,
    f: F,
) -> FnTool<I, F>
where
    I: JsonSchema + DeserializeOwned,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    FnTool {
        name: name.into(),
        description: description.into(),
        parameter_schema: schema_for!(I).to_value(),
        f,
        _input: PhantomData,
    }
}

impl<I, F, Fut> Tool for FnTool<I, F>
where
    I: DeserializeOwned + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    type Input = I;

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[inline]
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        (self.f)(input)
    }
}
