use agent_relay_core::Agent;
use agent_relay_core::tool::{Error as ToolError, Tool, ToolOutput, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, JsonSchema)]
pub struct HandOffParameters {
    #[schemars(description = "The language to translate into, e.g. Italian.")]
    language: String,
}

/// A tool that hands the user's request off to a translator agent.
///
/// Every call returns a copy of the translator, instructed to translate
/// into the requested language. The orchestrator runs it with the same
/// user input, and its reply becomes the tool result.
pub struct HandOffToTranslatorTool {
    translator: Agent,
    parameter_schema: Value,
}

impl HandOffToTranslatorTool {
    /// Creates a hand-off tool delegating to copies of `translator`.
    #[inline]
    pub fn new(translator: Agent) -> Self {
        Self {
            translator,
            parameter_schema: schema_for!(HandOffParameters).to_value(),
        }
    }
}

impl Tool for HandOffToTranslatorTool {
    type Input = HandOffParameters;

    fn name(&self) -> &str {
        "hand_off_to_translator"
    }

    fn description(&self) -> &str {
        "Hands the user's message off to a translator that replies with the \
         translation into the given language."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: HandOffParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let mut translator = self.translator.clone();
        async move {
            let language = input.language.trim();
            if language.is_empty() {
                return Err(ToolError::invalid_input()
                    .with_reason("`language` must not be empty"));
            }
            translator.set_instruction(format!(
                "Translate the user's message into {language}. Reply with \
                 the translation only."
            ));
            Ok(ToolOutput::Delegate(translator))
        }
    }
}
