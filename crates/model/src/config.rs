use serde_json::{Map, Value};

/// Sampling options every adapter recognizes.
///
/// Adapters hold one of these immutably. Options that only make sense
/// for a particular backend go to [`extras`](Self::extras), which the
/// adapter merges into its wire request as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound of tokens the model may produce in one completion.
    pub max_output_tokens: u32,
    /// Nucleus sampling probability mass.
    pub top_p: f32,
    /// Whether non-streaming generation should be served by a stream
    /// under the hood.
    pub stream: bool,
    /// Frequency and presence penalties.
    pub penalties: Penalties,
    /// Backend-specific options passed through untouched.
    pub extras: Map<String, Value>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_output_tokens: 15688,
            top_p: 1.0,
            stream: false,
            penalties: Penalties::default(),
            extras: Map::new(),
        }
    }
}

/// The frequency/presence penalty pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Penalties {
    /// Penalizes tokens by how often they already appeared.
    pub frequency: f32,
    /// Penalizes tokens that appeared at all.
    pub presence: f32,
}
