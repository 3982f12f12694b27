//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use agent_relay_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, ModelTool,
    ToolCallRequest,
};
use serde_json::{Value, json};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Error {
    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    finish_reason: ModelFinishReason,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.event_idx > this.events.len() {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }

        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        let event = match this.events.get(this.event_idx) {
            Some(PresetEvent::MessageDelta(msg)) => {
                ModelResponseEvent::MessageDelta(msg.clone())
            }
            Some(PresetEvent::ToolCall(req)) => {
                ModelResponseEvent::ToolCall(req.clone())
            }
            None => ModelResponseEvent::Completed(this.finish_reason),
        };
        this.event_idx += 1;
        Poll::Ready(Ok(Some(event)))
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    failed_attempts: u64,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how
/// the model should respond. Each generation call consumes the next
/// preset response in the order they were added, no matter what the
/// request contains. If the script runs out, an error will be returned.
///
/// Clones share the same script, so a clone can be kept around to
/// inspect the requests after the provider has been moved into an agent.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Appends a response to the script.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock_script().responses.push_back(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, oldest first.
    #[inline]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock_script().requests.clone()
    }

    /// Returns the number of preset responses not consumed yet.
    #[inline]
    pub fn remaining_responses(&self) -> usize {
        self.lock_script().responses.len()
    }

    fn lock_script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().expect("test script lock is poisoned")
    }

    fn next_response(
        &self,
        req: &ModelRequest,
    ) -> Result<TestModelResponse, Error> {
        let mut script = self.lock_script();
        script.requests.push(req.clone());

        let Some(preset) = script.responses.pop_front() else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::RateLimitExceeded,
            });
        };
        let should_fail = match preset.failures {
            Some(0) => true,
            Some(failures) => script.failed_attempts < failures,
            None => false,
        };
        if should_fail {
            // Keep the preset at the front, so it's retried next time.
            script.failed_attempts += 1;
            script.responses.push_front(preset);
            return Err(Error {
                message: "preset failure",
                kind: ErrorKind::Other,
            });
        }

        script.failed_attempts = 0;
        let finish_reason = if preset.has_tool_call() {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        };
        Ok(TestModelResponse {
            events: preset.events,
            finish_reason,
            event_idx: 0,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            sleep: None,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn generate_stream(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.next_response(req))
    }

    fn format_tool(&self, tool: &ModelTool) -> Value {
        json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": {
                "type": "object",
                "properties": tool.parameters,
                "required": tool.required,
            },
        })
    }

    fn format_tool_output(&self, call: &ToolCallRequest) -> Value {
        json!({
            "id": call.id,
            "name": call.name,
            "arguments": call.arguments,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use agent_relay_model::{ModelCompletion, ModelMessage};

    use super::*;

    async fn collect_events(
        resp: TestModelResponse,
    ) -> Vec<ModelResponseEvent> {
        let mut resp = pin!(resp);
        let mut events = vec![];
        while let Some(event) = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap()
        {
            events.push(event);
        }
        events
    }

    fn user_request(input: &str) -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User(input.to_owned())],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_scripted_stream() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Sure, ".to_owned()),
            PresetEvent::MessageDelta("let me take a look.".to_owned()),
            PresetEvent::tool_call(
                "call_1",
                "read_file",
                json!({ "filename": "todo.txt" }),
            ),
        ]));

        let resp = provider.generate_stream(&user_request("Hi")).await.unwrap();
        let events = collect_events(resp).await;
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[3],
            ModelResponseEvent::Completed(ModelFinishReason::ToolCalls)
        );
        assert_eq!(provider.remaining_responses(), 0);
    }

    #[tokio::test]
    async fn test_generate_in_order() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("first"));
        provider.add_response(PresetResponse::with_text("second"));

        let first = provider.generate(&user_request("a")).await.unwrap();
        let second = provider.generate(&user_request("b")).await.unwrap();
        assert_eq!(first, ModelCompletion::text("first"));
        assert_eq!(second, ModelCompletion::text("second"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1], user_request("b"));

        let err = provider.generate(&user_request("c")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_failures() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("ok").with_failures(2));

        for _ in 0..2 {
            let err = provider.generate(&user_request("x")).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Other);
        }
        let completion = provider.generate(&user_request("x")).await.unwrap();
        assert_eq!(completion.content.as_deref(), Some("ok"));

        let mut provider = TestModelProvider::default();
        provider
            .add_response(PresetResponse::with_text("never").with_failures(0));
        for _ in 0..3 {
            assert!(provider.generate(&user_request("x")).await.is_err());
        }
        assert_eq!(provider.remaining_responses(), 1);
    }

    #[test]
    fn test_clones_share_script() {
        let mut provider = TestModelProvider::default();
        let observer = provider.clone();
        provider.add_response(PresetResponse::with_text("hello"));
        assert_eq!(observer.remaining_responses(), 1);
    }
}
