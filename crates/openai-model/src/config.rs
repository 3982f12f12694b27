use std::env;
use std::fmt::{self, Debug};

use agent_relay_model::{ErrorKind, GenerationConfig, Penalties};
use serde_json::Value;

use crate::Error;

/// Environment variable consulted when no API key is given.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable consulted when no base URL is given.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Builder for [`OpenAIConfig`].
#[derive(Clone, PartialEq)]
pub struct OpenAIConfigBuilder {
    model: String,
    api_key: Option<String>,
    api_key_env: Option<String>,
    base_url: Option<String>,
    generation: GenerationConfig,
}

impl OpenAIConfigBuilder {
    /// Creates a builder for the given model identifier.
    #[inline]
    pub fn with_model<S: Into<String>>(model: S) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_key_env: None,
            base_url: None,
            generation: GenerationConfig::default(),
        }
    }

    /// Sets the API key. If not set, it's read from `OPENAI_API_KEY`.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Reads the API key from another environment variable than
    /// `OPENAI_API_KEY`, e.g. `XAI_API_KEY` for an OpenAI-compatible
    /// backend. An explicit [`with_api_key`](Self::with_api_key) wins.
    #[inline]
    pub fn with_api_key_env<S: Into<String>>(mut self, name: S) -> Self {
        self.api_key_env = Some(name.into());
        self
    }

    /// Sets a custom base URL. If not set, it's read from
    /// `OPENAI_BASE_URL`, falling back to the official endpoint.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation.temperature = temperature;
        self
    }

    /// Sets the maximum number of tokens in one completion.
    #[inline]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.generation.max_output_tokens = max_output_tokens;
        self
    }

    /// Sets the nucleus sampling probability mass.
    #[inline]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.generation.top_p = top_p;
        self
    }

    /// Makes non-streaming generation go through the streaming endpoint.
    #[inline]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.generation.stream = stream;
        self
    }

    /// Sets the frequency and presence penalties.
    #[inline]
    pub fn with_penalties(mut self, frequency: f32, presence: f32) -> Self {
        self.generation.penalties = Penalties {
            frequency,
            presence,
        };
        self
    }

    /// Adds a backend option that is sent with every request as-is.
    ///
    /// Extras are merged last, so they override the named options.
    #[inline]
    pub fn with_extra<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.generation.extras.insert(key.into(), value);
        self
    }

    /// Builds the configuration.
    ///
    /// Fails if the model identifier is empty, or no API key is given and
    /// the environment doesn't have one either.
    #[inline]
    pub fn build(self) -> Result<OpenAIConfig, Error> {
        self.build_with_env(|name| env::var(name).ok())
    }

    fn build_with_env<F>(self, env: F) -> Result<OpenAIConfig, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = self.model.trim().to_owned();
        if model.is_empty() {
            return Err(Error::new(
                "A valid OpenAI model name is required",
                ErrorKind::Other,
            ));
        }
        let key_env = self.api_key_env.as_deref().unwrap_or(API_KEY_ENV);
        let Some(api_key) = self.api_key.or_else(|| env(key_env)) else {
            return Err(Error::new(
                format!("No API key given and `{key_env}` is not set"),
                ErrorKind::Other,
            ));
        };
        let base_url = self
            .base_url
            .or_else(|| env(BASE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Ok(OpenAIConfig {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_owned(),
            generation: self.generation,
        })
    }
}

impl Debug for OpenAIConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfigBuilder")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("base_url", &self.base_url)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Configuration for the OpenAI-compatible provider.
#[derive(Clone, PartialEq)]
pub struct OpenAIConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) generation: GenerationConfig,
}

impl OpenAIConfig {
    /// Returns the model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the base URL, without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the sampling options.
    #[inline]
    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }
}

impl Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("generation", &self.generation)
            .finish()
    }
}
