use agent_relay_model::{ModelMessage, ModelResponseEvent};
use agent_relay_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::tool::{self, Tool, ToolResult, ToolSet};
use crate::{AgentBuilder, Error};

#[derive(Deserialize, JsonSchema)]
struct LookupInput {
    city: String,
}

fn lookup_tool() -> impl Tool<Input = LookupInput> {
    tool::from_fn(
        "lookup",
        "Looks up the weather of a city.",
        |input: LookupInput| async move {
            ToolResult::Ok(format!("Sunny in {}", input.city).into())
        },
    )
}

#[test]
fn test_name_is_required() {
    let err = AgentBuilder::with_model_provider(TestModelProvider::default())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAgent(_)));

    let err = AgentBuilder::with_model_provider(TestModelProvider::default())
        .with_name("  ")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAgent(_)));
}

#[test]
fn test_unknown_tool_choice() {
    let err = AgentBuilder::with_model_provider(TestModelProvider::default())
        .with_name("router")
        .with_tool(lookup_tool())
        .with_tool_choice("translate")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::ToolNotFound(ref n) if n == "translate"));
}

#[test]
fn test_instruction_and_messages() {
    let mut agent =
        AgentBuilder::with_model_provider(TestModelProvider::default())
            .with_name("router")
            .with_instruction("You route requests.")
            .build()
            .unwrap();
    assert_eq!(agent.name(), "router");
    assert_eq!(agent.instruction(), "You route requests.");
    assert_eq!(agent.messages(), None);

    let messages = vec![
        ModelMessage::System("Be brief.".to_owned()),
        ModelMessage::User("Hi".to_owned()),
    ];
    agent.set_messages(messages.clone());
    assert_eq!(agent.messages(), Some(messages.as_slice()));

    agent.set_instruction("You translate.");
    assert_eq!(agent.instruction(), "You translate.");
    assert_eq!(agent.messages(), Some(messages.as_slice()));
}

#[tokio::test]
async fn test_response_requires_messages() {
    let model_provider = TestModelProvider::default();
    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_name("router")
        .build()
        .unwrap();

    let err = agent.get_response().await.unwrap_err();
    assert!(matches!(err, Error::MessagesNotSet(ref n) if n == "router"));
    let err = agent.get_response_stream().await.unwrap_err();
    assert!(matches!(err, Error::MessagesNotSet(_)));
    assert!(model_provider.requests().is_empty());
}

#[tokio::test]
async fn test_tools_are_rendered() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_text("Hello"));

    let mut agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_name("router")
        .with_tool(lookup_tool())
        .with_tool_choice("lookup")
        .build()
        .unwrap();
    let expected_tool = json!({
        "name": "lookup",
        "description": "Looks up the weather of a city.",
        "parameters": {
            "type": "object",
            "properties": { "city": { "type": "string" } },
            "required": ["city"],
        },
    });
    assert_eq!(agent.rendered_tools(), [expected_tool.clone()]);
    assert_eq!(agent.tool_choice(), Some("lookup"));

    agent.set_messages(vec![ModelMessage::User("Hi".to_owned())]);
    let completion = agent.get_response().await.unwrap();
    assert_eq!(completion.content.as_deref(), Some("Hello"));

    let requests = model_provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tools, [expected_tool.clone()]);
    assert_eq!(requests[0].tool_choice, Some(expected_tool));

    // Dropping the chosen tool clears the choice.
    agent.set_tools(ToolSet::new()).unwrap();
    assert!(agent.rendered_tools().is_empty());
    assert_eq!(agent.tool_choice(), None);
    let err = agent.set_tool_choice("lookup").unwrap_err();
    assert!(matches!(err, Error::ToolNotFound(_)));
}

#[tokio::test]
async fn test_response_stream() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Hi, ".to_owned()),
        PresetEvent::MessageDelta("what can I do for you?".to_owned()),
    ]));

    let mut agent = AgentBuilder::with_model_provider(model_provider)
        .with_name("greeter")
        .build()
        .unwrap();
    agent.set_messages(vec![ModelMessage::User("Hello".to_owned())]);

    let mut stream = agent.get_response_stream().await.unwrap();
    let mut transcript = String::new();
    while let Some(event) = stream.next_event().await.unwrap() {
        if let ModelResponseEvent::MessageDelta(delta) = event {
            transcript.push_str(&delta);
        }
    }
    assert_eq!(transcript, "Hi, what can I do for you?");
    assert_eq!(stream.next_event().await.unwrap(), None);
}

#[tokio::test]
async fn test_switch_model_provider() {
    let mut old_provider = TestModelProvider::default();
    old_provider.add_response(PresetResponse::with_text("old"));
    let mut new_provider = TestModelProvider::default();
    new_provider.add_response(PresetResponse::with_text("new"));

    let mut agent = AgentBuilder::with_model_provider(old_provider.clone())
        .with_name("router")
        .with_tool(lookup_tool())
        .build()
        .unwrap();
    agent.set_messages(vec![ModelMessage::User("Hi".to_owned())]);
    agent.set_model_provider(new_provider.clone());

    let completion = agent.get_response().await.unwrap();
    assert_eq!(completion.content.as_deref(), Some("new"));
    assert_eq!(old_provider.remaining_responses(), 1);
    assert_eq!(new_provider.requests()[0].tools.len(), 1);
}
