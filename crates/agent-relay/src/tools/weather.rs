use agent_relay_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const CONDITIONS: [&str; 6] =
    ["Sunny", "Cloudy", "Rainy", "Windy", "Foggy", "Snowy"];

#[derive(Deserialize, JsonSchema)]
pub struct LookupWeatherParameters {
    #[schemars(description = "Name of the city, e.g. Rome.")]
    city: String,
}

/// A tool that reports the current weather of a city.
///
/// Reports are made up from the city name, so the same city always gets
/// the same weather. It's meant for demos and tests, not forecasts.
pub struct LookupWeatherTool {
    parameter_schema: Value,
}

impl LookupWeatherTool {
    /// Creates a new weather tool.
    #[inline]
    pub fn new() -> Self {
        LookupWeatherTool {
            parameter_schema: schema_for!(LookupWeatherParameters).to_value(),
        }
    }
}

impl Default for LookupWeatherTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for LookupWeatherTool {
    type Input = LookupWeatherParameters;

    fn name(&self) -> &str {
        "lookup_weather"
    }

    fn description(&self) -> &str {
        "Looks up the current weather and temperature of a city."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: LookupWeatherParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            let city = input.city.trim();
            if city.is_empty() {
                return Err(ToolError::invalid_input()
                    .with_reason("`city` must not be empty"));
            }
            Ok(weather_report(city).into())
        }
    }
}

fn weather_report(city: &str) -> String {
    let seed = city
        .chars()
        .flat_map(char::to_lowercase)
        .fold(0u32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as u32));
    let condition = CONDITIONS[seed as usize % CONDITIONS.len()];
    let celsius = (seed % 36) as i32 - 5;
    format!("{city}: {condition}, {celsius}°C")
}
