use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::ToolCallRequest;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelRequest {
    /// The conversation history, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tool declarations, already rendered by the provider's
    /// [`format_tool`](crate::ModelProvider::format_tool).
    pub tools: Vec<Value>,
    /// The preferred tool, rendered the same way as [`tools`](Self::tools).
    pub tool_choice: Option<Value>,
}

/// The role of a message's author.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// The human side of the conversation.
    User,
    /// The model.
    Assistant,
    /// A tool call result.
    Tool,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant message, possibly requesting tool calls.
    Assistant(AssistantMessage),
    /// A tool call result.
    Tool(ToolCallResult),
}

impl ModelMessage {
    /// Creates a text-only assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::Assistant(AssistantMessage {
            content: Some(content.into()),
            tool_calls: vec![],
        })
    }

    /// Returns the role of this message.
    #[inline]
    pub fn role(&self) -> Role {
        match self {
            ModelMessage::System(_) => Role::System,
            ModelMessage::User(_) => Role::User,
            ModelMessage::Assistant(_) => Role::Assistant,
            ModelMessage::Tool(_) => Role::Tool,
        }
    }

    /// Returns the text content of this message, if any.
    pub fn content(&self) -> Option<&str> {
        match self {
            ModelMessage::System(content) | ModelMessage::User(content) => {
                Some(content)
            }
            ModelMessage::Assistant(msg) => msg.content.as_deref(),
            ModelMessage::Tool(result) => Some(&result.content),
        }
    }
}

/// A message from the assistant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// The text content. Absent for pure tool-call messages.
    pub content: Option<String>,
    /// Tool calls the assistant requested, in the order they were issued.
    pub tool_calls: Vec<ToolCallRequest>,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The result of the tool call.
    pub content: String,
}

/// The calling signature of a tool.
///
/// Providers render this into their own tool declaration shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters of the tool, as the `properties` map of a
    /// [JSON schema](https://json-schema.org/) object.
    pub parameters: Map<String, Value>,
    /// Names of the parameters that must be present.
    pub required: Vec<String>,
}

impl ModelTool {
    /// Derives a signature from the full JSON schema of the tool input.
    ///
    /// Returns `None` unless `schema` describes an object, since tool
    /// arguments are always passed by name.
    pub fn from_schema<N, D>(
        name: N,
        description: D,
        schema: &Value,
    ) -> Option<Self>
    where
        N: Into<String>,
        D: Into<String>,
    {
        let schema = schema.as_object()?;
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            return None;
        }
        let parameters = match schema.get("properties") {
            Some(Value::Object(properties)) => properties.clone(),
            Some(_) => return None,
            None => Map::new(),
        };
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            name: name.into(),
            description: description.into(),
            parameters,
            required,
        })
    }
}
