//! Generative-model integration.
//!
//! The [`GenerativeProvider`] trait abstracts the model backend so the
//! orchestrator can run against any LLM service (or a test double). The
//! concrete [`OllamaProvider`] talks to a locally hosted Ollama instance and
//! requires the `ai` feature (default on):
//!
//! ```toml
//! # Disable AI support for a smaller binary
//! gamesight = { version = "0.1", default-features = false }
//! ```

mod provider;
pub use provider::GenerativeProvider;

#[cfg(feature = "ai")]
mod ollama;

#[cfg(feature = "ai")]
pub use ollama::{OllamaConfig, OllamaConfigBuilder, OllamaProvider};
