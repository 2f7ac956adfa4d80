//! Ollama provider implementation.
//!
//! Talks to a locally hosted Ollama instance (<https://ollama.com/>) through
//! its `/api/chat` endpoint. A local model keeps the dataset on the user's
//! machine, which is the point for this tool.

use super::GenerativeProvider;
use crate::error::{AnalysisError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama chat endpoint.
const DEFAULT_BASE_URL: &str = "http://localhost:11434/api/chat";

/// Default model; a reasonable pick for 16 GB of RAM.
const DEFAULT_MODEL: &str = "mistral";

/// Default timeout for one interpretation call. Local models can take tens of
/// seconds on large prompts.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Fixed system persona for every interpretation call.
const SYSTEM_PROMPT: &str = "You are an expert analyzing player data and charts from computer \
games. Answer in English, factually, clearly and concisely.";

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<Message>,
}

/// Configuration for the Ollama provider.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// The model to use (e.g., "mistral", "llama3").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Base URL for the chat endpoint (useful for remote Ollama hosts).
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl OllamaConfig {
    /// Create a new configuration builder.
    pub fn builder() -> OllamaConfigBuilder {
        OllamaConfigBuilder::default()
    }
}

/// Builder for [`OllamaConfig`].
#[derive(Default)]
pub struct OllamaConfigBuilder {
    model: Option<String>,
    timeout_secs: Option<u64>,
    base_url: Option<String>,
}

impl OllamaConfigBuilder {
    /// Set the model to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Set a custom chat endpoint URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OllamaConfig {
        OllamaConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Generative provider backed by a local Ollama instance.
///
/// # Example
///
/// ```rust,ignore
/// use gamesight::ai::{OllamaConfig, OllamaProvider};
///
/// let provider = OllamaProvider::new("mistral")?;
///
/// // With custom configuration
/// let config = OllamaConfig::builder()
///     .model("llama3")
///     .timeout_secs(120)
///     .build();
/// let provider = OllamaProvider::with_config(config)?;
/// ```
pub struct OllamaProvider {
    config: OllamaConfig,
    client: Client,
}

impl OllamaProvider {
    /// Create a provider for the given model with default settings.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        Self::with_config(OllamaConfig::builder().model(model).build())
    }

    /// Create a provider with explicit configuration.
    pub fn with_config(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn call_api(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
        };

        debug!(
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            "sending prompt to Ollama"
        );
        let response = self.client.post(&self.config.base_url).json(&request).send()?;

        if !response.status().is_success() {
            return Err(AnalysisError::AiClientError(format!(
                "Ollama API error {}: {}",
                response.status(),
                response.text()?
            )));
        }

        let result: OllamaResponse = response.json()?;
        Self::extract_content(result)
    }

    fn extract_content(response: OllamaResponse) -> Result<String> {
        response
            .message
            .map(|msg| msg.content)
            .ok_or_else(|| AnalysisError::AiClientError("no response content from Ollama".to_string()))
    }
}

impl GenerativeProvider for OllamaProvider {
    fn interpret(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.call_api(prompt)?)
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}
