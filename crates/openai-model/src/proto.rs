use agent_relay_model::{
    ErrorKind, ModelCompletion, ModelFinishReason, ModelMessage, ModelRequest,
    ModelTool, ToolCallRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{Error, OpenAIConfig};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionToolCall {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// A tool call record, complete or partial (in a streamed delta).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub r#type: Option<String>,
    pub function: Option<FunctionToolCall>,
}

impl ToolCall {
    #[inline]
    pub fn into_request(self) -> ToolCallRequest {
        let function = self.function.unwrap_or_default();
        ToolCallRequest {
            id: self.id.unwrap_or_default(),
            name: function.name.unwrap_or_default(),
            arguments: function.arguments.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CompletionChoice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<Value>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    response_format: ResponseFormat,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
    stream: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

// -----------
// Conversions
// -----------

pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
    stream: bool,
) -> ChatCompletionRequest {
    let generation = &config.generation;
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        response_format: ResponseFormat { r#type: "text" },
        temperature: generation.temperature,
        max_completion_tokens: generation.max_output_tokens,
        top_p: generation.top_p,
        frequency_penalty: generation.penalties.frequency,
        presence_penalty: generation.penalties.presence,
        tools: req.tools.clone(),
        tool_choice: req.tool_choice.as_ref().map(create_tool_choice),
        stream_options: stream.then_some(StreamOptions {
            include_usage: true,
        }),
        stream,
    }
}

/// Creates the JSON body to post, with the configured extras merged on
/// top of the named options.
pub fn create_request_body(
    req: &ModelRequest,
    config: &OpenAIConfig,
    stream: bool,
) -> Result<Value, serde_json::Error> {
    let mut body = serde_json::to_value(create_request(req, config, stream))?;
    if let Some(body) = body.as_object_mut() {
        for (key, value) in &config.generation.extras {
            body.insert(key.clone(), value.clone());
        }
    }
    Ok(body)
}

fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(msg) => Message::Assistant {
            content: msg.content.clone(),
            tool_calls: if msg.tool_calls.is_empty() {
                None
            } else {
                Some(msg.tool_calls.iter().map(format_tool_output).collect())
            },
        },
        ModelMessage::Tool(result) => Message::Tool {
            tool_call_id: result.id.clone(),
            content: result.content.clone(),
        },
    }
}

/// Chat completions only accept a bare `{type, function: {name}}` as the
/// tool choice, so the rendered declaration is narrowed down to that.
/// Anything else (like `"auto"`) is sent untouched.
fn create_tool_choice(choice: &Value) -> Value {
    let name = choice
        .get("function")
        .and_then(|function| function.get("name"))
        .and_then(Value::as_str);
    match name {
        Some(name) => json!({
            "type": "function",
            "function": { "name": name },
        }),
        None => choice.clone(),
    }
}

pub fn format_tool(tool: &ModelTool) -> Value {
    // Strict mode only accepts schemas where every property is required.
    let strict = tool
        .parameters
        .keys()
        .all(|name| tool.required.contains(name));
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": {
                "type": "object",
                "properties": tool.parameters,
                "required": tool.required,
                "additionalProperties": false,
            },
            "strict": strict,
        },
    })
}

pub fn format_tool_output(call: &ToolCallRequest) -> Value {
    json!({
        "id": call.id,
        "type": "function",
        "function": {
            "name": call.name,
            "arguments": call.arguments,
        },
    })
}

pub fn parse_finish_reason(reason: &str) -> Result<ModelFinishReason, Error> {
    match reason {
        "tool_calls" | "function_call" => Ok(ModelFinishReason::ToolCalls),
        "length" => Ok(ModelFinishReason::Length),
        "content_filter" => Err(Error::new(
            "the response was blocked by the content filter",
            ErrorKind::Moderated,
        )),
        _ => Ok(ModelFinishReason::Stop),
    }
}

pub fn create_completion(
    completion: ChatCompletion,
) -> Result<ModelCompletion, Error> {
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new("the response has no choices", ErrorKind::Other));
    };
    let finish_reason = choice
        .finish_reason
        .as_deref()
        .map(parse_finish_reason)
        .transpose()?;
    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(ToolCall::into_request)
        .collect();
    Ok(ModelCompletion {
        content: choice.message.content,
        tool_calls,
        finish_reason,
    })
}
