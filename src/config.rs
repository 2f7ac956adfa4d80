//! Configuration for the analysis pipeline.
//!
//! All knobs are static, process-wide values consulted by value at analysis
//! time; nothing here is mutated at runtime. Use the builder for fluent setup.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Hard limit on characters sent to the generative model in one prompt.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 120_000;

/// Total number of sample rows handed to the generative model.
pub const DEFAULT_MAX_SAMPLE_ROWS: usize = 800;

/// Top-N values reported for categorical columns.
pub const DEFAULT_TOP_N_CATEGORIES: usize = 10;

/// Row count above which the map-reduce path kicks in (boundary inclusive:
/// exactly this many rows still takes the direct path).
pub const DEFAULT_CHUNK_ROWS: usize = 50_000;

/// Fixed seed for reproducible sampling.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Default local model identifier.
pub const DEFAULT_MODEL: &str = "mistral";

// The truncation marker must always fit inside the prompt budget.
const_assert!(DEFAULT_MAX_PROMPT_CHARS > 64);
const_assert!(DEFAULT_CHUNK_ROWS > 0);

/// Configuration for the analysis pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use gamesight::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .max_sample_rows(400)
///     .chunk_rows(10_000)
///     .enable_map_reduce(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hard character budget for every outgoing prompt (data and merge).
    /// Default: 120 000
    pub max_prompt_chars: usize,

    /// Row cap for the representative sample embedded into a prompt.
    /// Default: 800
    pub max_sample_rows: usize,

    /// Number of most frequent values reported per categorical column.
    /// Default: 10
    pub top_n_categories: usize,

    /// Chunk size (in rows) for the map-reduce path. Datasets with at most
    /// this many rows are analyzed in one shot.
    /// Default: 50 000
    pub chunk_rows: usize,

    /// Whether oversized datasets are chunked at all. When false, everything
    /// goes through the direct path regardless of size.
    /// Default: true
    pub enable_map_reduce: bool,

    /// Seed for all random draws in the sampler. Fixed by default so sampling
    /// is reproducible for identical inputs.
    /// Default: 42
    pub sample_seed: u64,

    /// Identifier of the generative model handed to the provider.
    /// Default: "mistral"
    pub model: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            max_sample_rows: DEFAULT_MAX_SAMPLE_ROWS,
            top_n_categories: DEFAULT_TOP_N_CATEGORIES,
            chunk_rows: DEFAULT_CHUNK_ROWS,
            enable_map_reduce: true,
            sample_seed: DEFAULT_SAMPLE_SEED,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_prompt_chars < 64 {
            return Err(ConfigValidationError::PromptBudgetTooSmall(
                self.max_prompt_chars,
            ));
        }
        if self.max_sample_rows == 0 {
            return Err(ConfigValidationError::ZeroField("max_sample_rows"));
        }
        if self.top_n_categories == 0 {
            return Err(ConfigValidationError::ZeroField("top_n_categories"));
        }
        if self.chunk_rows == 0 {
            return Err(ConfigValidationError::ZeroField("chunk_rows"));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Prompt budget too small: {0} chars (must leave room for the truncation marker)")]
    PromptBudgetTooSmall(usize),

    #[error("Invalid value for '{0}': must be at least 1")]
    ZeroField(&'static str),
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    max_prompt_chars: Option<usize>,
    max_sample_rows: Option<usize>,
    top_n_categories: Option<usize>,
    chunk_rows: Option<usize>,
    enable_map_reduce: Option<bool>,
    sample_seed: Option<u64>,
    model: Option<String>,
}

impl AnalysisConfigBuilder {
    /// Set the hard character budget for prompts.
    pub fn max_prompt_chars(mut self, chars: usize) -> Self {
        self.max_prompt_chars = Some(chars);
        self
    }

    /// Set the row cap for representative samples.
    pub fn max_sample_rows(mut self, rows: usize) -> Self {
        self.max_sample_rows = Some(rows);
        self
    }

    /// Set the number of top values reported per categorical column.
    pub fn top_n_categories(mut self, n: usize) -> Self {
        self.top_n_categories = Some(n);
        self
    }

    /// Set the chunk size (in rows) for the map-reduce path.
    pub fn chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = Some(rows);
        self
    }

    /// Enable or disable map-reduce for oversized datasets.
    pub fn enable_map_reduce(mut self, enable: bool) -> Self {
        self.enable_map_reduce = Some(enable);
        self
    }

    /// Override the sampling seed (fixed by default for reproducibility).
    pub fn sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    /// Set the generative model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let config = AnalysisConfig {
            max_prompt_chars: self.max_prompt_chars.unwrap_or(DEFAULT_MAX_PROMPT_CHARS),
            max_sample_rows: self.max_sample_rows.unwrap_or(DEFAULT_MAX_SAMPLE_ROWS),
            top_n_categories: self.top_n_categories.unwrap_or(DEFAULT_TOP_N_CATEGORIES),
            chunk_rows: self.chunk_rows.unwrap_or(DEFAULT_CHUNK_ROWS),
            enable_map_reduce: self.enable_map_reduce.unwrap_or(true),
            sample_seed: self.sample_seed.unwrap_or(DEFAULT_SAMPLE_SEED),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };
        config.validate()?;
        Ok(config)
    }
}
