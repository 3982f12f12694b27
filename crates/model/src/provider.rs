use std::error::Error;

use serde_json::Value;

use crate::error::ErrorKind;
use crate::request::{ModelRequest, ModelTool};
use crate::response::{
    ModelCompletion, ModelResponse, ToolCallRequest, collect_response,
};

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a backend adapter, which wraps one LLM
/// provider's request and response shapes.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime. All
/// options are fixed at construction time; per-request variation only
/// comes in through [`ModelRequest`].
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The streaming response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Generates a single, complete result.
    ///
    /// The default implementation drains
    /// [`generate_stream`](Self::generate_stream). Providers with a
    /// dedicated non-streaming endpoint should override it.
    fn generate(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelCompletion, Self::Error>> + Send + 'static
    {
        let resp_fut = self.generate_stream(req);
        async move { collect_response(resp_fut.await?).await }
    }

    /// Sends a request and returns a lazy stream of partial results.
    fn generate_stream(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;

    /// Renders a tool signature into the backend's tool declaration shape.
    fn format_tool(&self, tool: &ModelTool) -> Value;

    /// Renders a tool call record into the backend's wire shape.
    fn format_tool_output(&self, call: &ToolCallRequest) -> Value;
}
