//! Custom error types for the analysis pipeline.
//!
//! Errors are serializable for desktop IPC compatibility, allowing them to be
//! sent to a frontend shell for display. Note that the orchestrator's public
//! contract never surfaces these across its boundary: external-service
//! failures are rendered inline into the report text instead (see
//! [`crate::orchestrator`]).

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis pipeline.
///
/// Configuration validation has its own error type,
/// [`crate::config::ConfigValidationError`].
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Dataset summarization failed.
    #[error("Failed to summarize dataset: {0}")]
    SummarizationFailed(String),

    /// Sampling failed.
    #[error("Failed to sample dataset: {0}")]
    SamplingFailed(String),

    /// Generative model client error (bad status, empty response).
    #[error("AI client error: {0}")]
    AiClientError(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// HTTP request error (for the AI client, only with the "ai" feature).
    #[cfg(feature = "ai")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SummarizationFailed(_) => "SUMMARIZATION_FAILED",
            Self::SamplingFailed(_) => "SAMPLING_FAILED",
            Self::AiClientError(_) => "AI_CLIENT_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            #[cfg(feature = "ai")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }
}

/// Serialize implementation for desktop IPC compatibility.
///
/// Errors are serialized as a struct with `code` and `message` fields,
/// making them easy to handle in a frontend.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}
