use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use agent_relay_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;
use crate::proto::{self, ChatCompletionChunk, ToolCall};

pub(crate) type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

struct StreamState {
    sse: Sse,
    // Tool calls arrive in fragments keyed by their index. They are only
    // emitted once the stream has ended and every fragment is merged.
    tool_calls: Vec<ToolCall>,
    pending_events: VecDeque<ModelResponseEvent>,
    finish_reason: Option<ModelFinishReason>,
    done: bool,
}

impl StreamState {
    fn merge_tool_call(&mut self, delta: ToolCall) {
        let partial = match (delta.index, &delta.id) {
            (Some(index), _) => {
                self.tool_calls.iter_mut().find(|t| t.index == Some(index))
            }
            // Continuation fragments without an index extend the latest
            // call.
            (None, None) => self.tool_calls.last_mut(),
            (None, Some(_)) => None,
        };
        let Some(partial) = partial else {
            self.tool_calls.push(delta);
            return;
        };
        if partial.id.is_none() {
            partial.id = delta.id;
        }
        if partial.r#type.is_none() {
            partial.r#type = delta.r#type;
        }
        let Some(function) = delta.function else {
            return;
        };
        let partial_func = partial.function.get_or_insert_default();
        if let Some(name) = function.name {
            partial_func.name.get_or_insert_default().push_str(&name);
        }
        if let Some(arguments) = function.arguments {
            partial_func
                .arguments
                .get_or_insert_default()
                .push_str(&arguments);
        }
    }

    fn finish(&mut self) {
        self.done = true;
        let has_tool_calls = !self.tool_calls.is_empty();
        for tool_call in self.tool_calls.drain(..) {
            let req = tool_call.into_request();
            self.pending_events
                .push_back(ModelResponseEvent::ToolCall(req));
        }
        let finish_reason = match self.finish_reason.take() {
            Some(reason) => reason,
            None if has_tool_calls => ModelFinishReason::ToolCalls,
            None => ModelFinishReason::Stop,
        };
        self.pending_events
            .push_back(ModelResponseEvent::Completed(finish_reason));
    }
}

type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    /// A streamed chat completion.
    ///
    /// Text deltas are emitted as they arrive, tool calls after the last
    /// chunk, and the completion event always comes last.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let state = StreamState {
            sse,
            tool_calls: Vec::new(),
            pending_events: VecDeque::new(),
            finish_reason: None,
            done: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, state) = match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => (event, state),
            Ok((None, _)) => {
                *this.next_event_fut = None;
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_event_fut = None;
                return Poll::Ready(Err(err));
            }
        };
        *this.next_event_fut = Some(Box::pin(next_event(state)));
        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    loop {
        if let Some(event) = state.pending_events.pop_front() {
            return Ok((Some(event), state));
        }
        if state.done {
            return Ok((None, state));
        }

        let sse_event = match state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                state.finish();
                continue;
            }
            Err(err) => {
                return Err(Error::new(format!("{err}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            state.finish();
            continue;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| {
                Error::new(format!("malformed chunk: {err}"), ErrorKind::Other)
            })?;
        // The trailing usage chunk carries no choices.
        let Some(choice) = chunk.choices.into_iter().next() else {
            continue;
        };
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            state
                .pending_events
                .push_back(ModelResponseEvent::MessageDelta(content));
        }
        for tool_call in choice.delta.tool_calls.unwrap_or_default() {
            state.merge_tool_call(tool_call);
        }
        if let Some(reason) = choice.finish_reason {
            state.finish_reason = Some(proto::parse_finish_reason(&reason)?);
        }
    }
}
