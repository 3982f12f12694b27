//! A model provider for OpenAI-compatible chat completion APIs.
//!
//! Any backend speaking the `/chat/completions` protocol works. Grok,
//! DeepSeek, Anthropic's compatibility endpoint or a local Llama server are
//! reached by setting the base URL, and their key can be read from its own
//! variable with [`OpenAIConfigBuilder::with_api_key_env`].

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use agent_relay_model::{
    ErrorKind, ModelCompletion, ModelProvider, ModelProviderError,
    ModelRequest, ModelTool, ToolCallRequest, collect_response,
};
use mime::Mime;
use reqwest::{Client, Response, StatusCode, header};
use serde_json::Value;

pub use config::{API_KEY_ENV, BASE_URL_ENV, OpenAIConfig, OpenAIConfigBuilder};
use io::{ChunkReader, Sse};
use proto::ChatCompletion;
pub use response::OpenAIResponse;
use response::PinnedFuture;

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn send(
        &self,
        req: &ModelRequest,
        stream: bool,
    ) -> impl Future<Output = Result<Response, Error>> + Send + 'static {
        let body = proto::create_request_body(req, &self.config, stream);
        let accept = if stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        let req_builder = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, accept);

        async move {
            let body = body.map_err(|err| {
                Error::new(
                    format!("failed to encode the request: {err}"),
                    ErrorKind::Other,
                )
            })?;
            trace!("sending request: {body}");
            let resp = req_builder
                .json(&body)
                .send()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

            let status = resp.status();
            if !status.is_success() {
                let kind = if status == StatusCode::TOO_MANY_REQUESTS {
                    ErrorKind::RateLimitExceeded
                } else {
                    ErrorKind::Other
                };
                let detail = resp.text().await.unwrap_or_default();
                return Err(Error::new(
                    format!("server responded with {status}: {detail}"),
                    kind,
                ));
            }
            check_content_type(&resp, accept)?;
            Ok(resp)
        }
    }
}

fn check_content_type(resp: &Response, expected: &str) -> Result<(), Error> {
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let is_expected = content_type
        .and_then(|v| v.parse::<Mime>().ok())
        .is_some_and(|m| m.essence_str() == expected);
    if !is_expected {
        return Err(Error::new(
            format!("Unexpected content type: {content_type:?}"),
            ErrorKind::Other,
        ));
    }
    Ok(())
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn generate(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelCompletion, Self::Error>> + Send + 'static
    {
        let fut: PinnedFuture<Result<ModelCompletion, Error>> =
            if self.config.generation.stream {
                let resp_fut = self.generate_stream(req);
                Box::pin(async move { collect_response(resp_fut.await?).await })
            } else {
                let resp_fut = self.send(req, false);
                Box::pin(async move {
                    let completion = resp_fut
                        .await?
                        .json::<ChatCompletion>()
                        .await
                        .map_err(|err| {
                            Error::new(
                                format!("malformed completion: {err}"),
                                ErrorKind::Other,
                            )
                        })?;
                    proto::create_completion(completion)
                })
            };
        fut
    }

    fn generate_stream(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let resp_fut = self.send(req, true);
        async move {
            let resp = resp_fut.await?;
            let sse = Sse::new(ChunkReader::from_response(resp));
            Ok(OpenAIResponse::from_sse(sse))
        }
    }

    #[inline]
    fn format_tool(&self, tool: &ModelTool) -> Value {
        proto::format_tool(tool)
    }

    #[inline]
    fn format_tool_output(&self, call: &ToolCallRequest) -> Value {
        proto::format_tool_output(call)
    }
}
