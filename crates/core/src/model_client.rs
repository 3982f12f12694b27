use std::fmt::{self, Debug};
use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use agent_relay_model::{
    ModelCompletion, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent, ModelTool, ToolCallRequest,
};
use futures::Stream;
use serde_json::Value;
use tracing::Instrument;

use crate::{Error, Result};

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

trait ProviderObject: Send + Sync + 'static {
    fn generate(
        &self,
        req: &ModelRequest,
    ) -> PinnedFuture<Result<ModelCompletion>>;

    fn generate_stream(
        &self,
        req: &ModelRequest,
    ) -> PinnedFuture<Result<ResponseStream>>;

    fn format_tool(&self, tool: &ModelTool) -> Value;

    fn format_tool_output(&self, call: &ToolCallRequest) -> Value;
}

struct ProviderObjectImpl<P>(P);

impl<P: ModelProvider + 'static> ProviderObject for ProviderObjectImpl<P> {
    fn generate(
        &self,
        req: &ModelRequest,
    ) -> PinnedFuture<Result<ModelCompletion>> {
        trace!("got a request: {req:?}");
        let fut = self.0.generate(req);
        Box::pin(
            async move {
                let completion = fut.await.map_err(|err| {
                    error!("got an error: {err}");
                    Error::from_provider(err)
                })?;
                trace!("got a completion: {completion:?}");
                Ok(completion)
            }
            .instrument(trace_span!("model client req")),
        )
    }

    fn generate_stream(
        &self,
        req: &ModelRequest,
    ) -> PinnedFuture<Result<ResponseStream>> {
        trace!("got a stream request: {req:?}");
        let fut = self.0.generate_stream(req);
        Box::pin(
            async move {
                let resp = fut.await.map_err(|err| {
                    error!("got an error: {err}");
                    Error::from_provider(err)
                })?;
                Ok(ResponseStream::new(resp))
            }
            .instrument(trace_span!("model client stream req")),
        )
    }

    #[inline]
    fn format_tool(&self, tool: &ModelTool) -> Value {
        self.0.format_tool(tool)
    }

    #[inline]
    fn format_tool_output(&self, call: &ToolCallRequest) -> Value {
        self.0.format_tool_output(call)
    }
}

/// A wrapper around a model provider that provides a type-erased
/// interface for agents.
///
/// Cloning is cheap, clones share the same provider.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn ProviderObject>,
}

impl ModelClient {
    /// Wraps a model provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        Self {
            provider: Arc::new(ProviderObjectImpl(provider)),
        }
    }

    /// Generates a single, complete result.
    #[inline]
    pub fn generate(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelCompletion>> + Send + 'static {
        self.provider.generate(req)
    }

    /// Sends a request and returns a lazy stream of response events.
    #[inline]
    pub fn generate_stream(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ResponseStream>> + Send + 'static {
        self.provider.generate_stream(req)
    }

    /// Renders a calling signature in the provider's tool shape.
    #[inline]
    pub fn format_tool(&self, tool: &ModelTool) -> Value {
        self.provider.format_tool(tool)
    }

    /// Renders a tool call record in the provider's wire shape.
    #[inline]
    pub fn format_tool_output(&self, call: &ToolCallRequest) -> Value {
        self.provider.format_tool_output(call)
    }
}

impl Debug for ModelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClient").finish_non_exhaustive()
    }
}

trait ErasedResponse: Send {
    fn poll_next_event(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>>>;
}

struct ErasedResponseImpl<R>(Pin<Box<R>>);

impl<R: ModelResponse> ErasedResponse for ErasedResponseImpl<R> {
    #[inline]
    fn poll_next_event(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>>> {
        self.0
            .as_mut()
            .poll_next_event(cx)
            .map_err(Error::from_provider)
    }
}

/// A lazy, single-pass stream of events from a model response.
///
/// The stream ends after the first error. Dropping it stops receiving
/// further events.
pub struct ResponseStream {
    inner: Box<dyn ErasedResponse>,
    finished: bool,
}

impl ResponseStream {
    fn new<R: ModelResponse>(resp: R) -> Self {
        Self {
            inner: Box::new(ErasedResponseImpl(Box::pin(resp))),
            finished: false,
        }
    }

    /// Waits for the next event, or `None` once the response is complete.
    #[inline]
    pub async fn next_event(&mut self) -> Result<Option<ModelResponseEvent>> {
        poll_fn(|cx| self.poll_event(cx)).await
    }

    /// Drains the remaining events into a [`ModelCompletion`].
    pub async fn into_completion(mut self) -> Result<ModelCompletion> {
        let mut completion = ModelCompletion::default();
        while let Some(event) = self.next_event().await? {
            completion.apply_event(event);
        }
        Ok(completion)
    }

    fn poll_event(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>>> {
        if self.finished {
            return Poll::Ready(Ok(None));
        }
        let event_or_err = ready!(self.inner.poll_next_event(cx));
        if !matches!(event_or_err, Ok(Some(_))) {
            self.finished = true;
        }
        Poll::Ready(event_or_err)
    }
}

impl Stream for ResponseStream {
    type Item = Result<ModelResponseEvent>;

    #[inline]
    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_event(cx).map(Result::transpose)
    }
}

impl Debug for ResponseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use agent_relay_model::{ErrorKind, ModelFinishReason, ModelMessage};
    use agent_relay_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };
    use futures::StreamExt;
    use serde_json::json;

    use super::*;

    fn hi_request() -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("How ".to_owned()),
            PresetEvent::MessageDelta("are ".to_owned()),
            PresetEvent::MessageDelta("you?".to_owned()),
        ]));
        let model_client = ModelClient::new(model_provider);

        let completion = model_client.generate(&hi_request()).await.unwrap();
        assert_eq!(completion.content.as_deref(), Some("How are you?"));
        assert_eq!(completion.finish_reason, Some(ModelFinishReason::Stop));
    }

    #[tokio::test]
    async fn test_stream() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Checking".to_owned()),
            PresetEvent::tool_call("call_1", "lookup", json!({})),
        ]));
        model_provider.add_response(PresetResponse::with_text("Done"));
        let model_client = ModelClient::new(model_provider);

        let stream = model_client.generate_stream(&hi_request()).await.unwrap();
        let events: Vec<_> = stream.map(Result::unwrap).collect().await;
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[2],
            ModelResponseEvent::Completed(ModelFinishReason::ToolCalls)
        ));

        let stream = model_client.generate_stream(&hi_request()).await.unwrap();
        let completion = stream.into_completion().await.unwrap();
        assert_eq!(completion.content.as_deref(), Some("Done"));
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_client = ModelClient::new(TestModelProvider::default());
        let err = model_client.generate(&hi_request()).await.unwrap_err();
        assert_eq!(err.model_error_kind(), Some(ErrorKind::RateLimitExceeded));

        let err = model_client
            .generate_stream(&hi_request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Model { .. }));
    }

    #[test]
    fn test_format() {
        let model_client = ModelClient::new(TestModelProvider::default());
        let call = ToolCallRequest {
            id: "call_1".to_owned(),
            name: "lookup".to_owned(),
            arguments: "{}".to_owned(),
        };
        assert_eq!(
            model_client.format_tool_output(&call),
            json!({ "id": "call_1", "name": "lookup", "arguments": "{}" })
        );
    }
}
