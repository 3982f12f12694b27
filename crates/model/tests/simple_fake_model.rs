use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use agent_relay_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    ModelTool, ToolCallRequest,
};
use serde_json::{Value, json};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct EchoError(ErrorKind);

impl Display for EchoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoError {}

impl ModelProviderError for EchoError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message word by word, then calls `remember`
/// with the whole text.
struct EchoResponse {
    words: VecDeque<String>,
    echoed: String,
    tool_call_sent: bool,
    finished: bool,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoResponse {
    fn new(input: &str) -> Self {
        let words = format!("You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        Self {
            words,
            echoed: input.to_owned(),
            tool_call_sent: false,
            finished: false,
            sleep: None,
        }
    }
}

impl ModelResponse for EchoResponse {
    type Error = EchoError;

    fn poll_next_event(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let sleep = self
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(Duration::from_millis(1))));
        ready!(sleep.as_mut().poll(cx));
        self.sleep = None;

        if let Some(mut word) = self.words.pop_front() {
            if !self.words.is_empty() {
                word.push(' ');
            }
            return Poll::Ready(Ok(Some(ModelResponseEvent::MessageDelta(
                word,
            ))));
        }
        if !self.tool_call_sent {
            self.tool_call_sent = true;
            let arguments = json!({ "text": self.echoed }).to_string();
            return Poll::Ready(Ok(Some(ModelResponseEvent::ToolCall(
                ToolCallRequest {
                    id: "call_0".to_owned(),
                    name: "remember".to_owned(),
                    arguments,
                },
            ))));
        }
        if !self.finished {
            self.finished = true;
            return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                ModelFinishReason::ToolCalls,
            ))));
        }
        Poll::Ready(Ok(None))
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = EchoError;
    type Response = EchoResponse;

    fn generate_stream(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user_input = req.messages.iter().rev().find_map(|msg| {
            match msg {
                ModelMessage::User(text) => Some(text.as_str()),
                _ => None,
            }
        });
        let result = match last_user_input {
            Some(input) => Ok(EchoResponse::new(input)),
            None => Err(EchoError(ErrorKind::Other)),
        };
        ready(result)
    }

    fn format_tool(&self, tool: &ModelTool) -> Value {
        json!({ "name": tool.name, "args": tool.parameters })
    }

    fn format_tool_output(&self, call: &ToolCallRequest) -> Value {
        json!({ "id": call.id, "name": call.name })
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    #[tokio::test]
    async fn test_stream() {
        let provider = EchoProvider;
        let req = ModelRequest {
            messages: vec![ModelMessage::User("Good morning".to_string())],
            ..Default::default()
        };
        let mut resp = provider.generate_stream(&req).await.unwrap();

        let mut resp_message = String::new();
        loop {
            let resp_fut =
                poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx));
            match resp_fut.await {
                Ok(Some(event)) => match event {
                    ModelResponseEvent::MessageDelta(delta) => {
                        resp_message.push_str(&delta);
                    }
                    ModelResponseEvent::ToolCall(_) => {}
                    ModelResponseEvent::Completed(_) => {}
                },
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }

        assert_eq!(resp_message, "You said Good morning");
        // Completed responses stay completed.
        let event = poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
            .await
            .unwrap();
        assert!(event.is_none());
    }

    #[tokio::test]
    async fn test_default_generate_collects_stream() {
        let provider = EchoProvider;
        let req = ModelRequest {
            messages: vec![
                ModelMessage::assistant("I echo things."),
                ModelMessage::User("Hi there".to_string()),
            ],
            ..Default::default()
        };
        let completion = provider.generate(&req).await.unwrap();
        assert_eq!(completion.content.as_deref(), Some("You said Hi there"));
        assert_eq!(
            completion.finish_reason,
            Some(ModelFinishReason::ToolCalls)
        );
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].name, "remember");
        let arguments: Value =
            serde_json::from_str(&completion.tool_calls[0].arguments).unwrap();
        assert_eq!(arguments, json!({ "text": "Hi there" }));
    }

    #[tokio::test]
    async fn test_error() {
        let provider = EchoProvider;
        let req = ModelRequest::default();
        let err = provider.generate(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
