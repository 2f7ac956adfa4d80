//! Provider trait for abstracting generative-model interactions.

use anyhow::Result;

/// Trait for generative-model backends that interpret analysis prompts.
///
/// Implementations must be `Send + Sync` so analyses can run from background
/// threads. The orchestrator treats calls as blocking, potentially slow I/O
/// and never lets a provider failure cross its own boundary: errors are
/// rendered inline into the report text.
pub trait GenerativeProvider: Send + Sync {
    /// Send one prompt and return the model's textual interpretation.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, the request fails, or
    /// the response carries no content. The orchestrator captures these as
    /// `[Error]: <message>` markers.
    fn interpret(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging and debugging.
    fn name(&self) -> &str;

    /// Model identifier used by this provider, if it exposes one.
    fn model(&self) -> Option<&str> {
        None
    }
}
