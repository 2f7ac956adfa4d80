//! Summarization and AI-interpretation pipeline for game-sales datasets.
//!
//! # Overview
//!
//! This library turns an arbitrary tabular dataset into a bounded,
//! information-dense request for a locally hosted language model and returns
//! the model's textual interpretation:
//!
//! - **Profiling**: shape, missingness, numeric statistics with percentiles,
//!   IQR outlier notes, categorical distributions and date ranges, rendered
//!   as a condensed markdown summary
//! - **Representative sampling**: deterministic stratified sampling with
//!   quantile-bin and uniform fallback tiers under a strict row budget
//! - **Prompt construction**: column descriptions, analysis checklist,
//!   summary and sample assembled into one request, hard-truncated to a
//!   character budget
//! - **Map-reduce orchestration**: oversized datasets are partitioned,
//!   interpreted chunk by chunk and consolidated through a merge call, with
//!   partial-failure tolerance
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gamesight::{AnalysisConfig, AnalysisOrchestrator, AnalysisRequest};
//! use gamesight::ai::OllamaProvider;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(OllamaProvider::new("mistral")?);
//! let orchestrator = AnalysisOrchestrator::new(AnalysisConfig::default(), provider);
//!
//! let request = AnalysisRequest {
//!     selected_categories: vec!["price".into(), "genres".into()],
//!     user_prompt: "focus on indie titles".into(),
//!     ..Default::default()
//! };
//!
//! // `df` comes from a DatasetSource collaborator (SQL layer, CSV, ...)
//! let report = orchestrator.analyze(&df, &request);
//! println!("{report}");
//! ```
//!
//! The orchestrator never fails: an empty dataset yields a fixed no-data
//! message without a model call, and provider errors are embedded inline as
//! `[Error]: <message>` markers so partial progress stays visible.
//!
//! # Background execution
//!
//! Analyses are blocking (model calls can take tens of seconds); run them off
//! the interactive thread:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! let orchestrator = Arc::new(orchestrator);
//! orchestrator.spawn(df, request, |report| {
//!     // hand the report back to the UI
//! });
//! ```

pub mod ai;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod profiler;
pub mod prompt;
pub mod sampler;
pub mod source;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt};
pub use orchestrator::{AnalysisOrchestrator, NO_DATA_MESSAGE};
pub use profiler::DatasetProfiler;
pub use prompt::PromptBuilder;
pub use sampler::RepresentativeSampler;
pub use source::{CsvSource, DatasetSource};
pub use types::{AnalysisRequest, ChartSnapshot, ChunkResult, ColumnSchema, DatasetSchema};
pub use utils::{ColumnKind, TRUNCATION_MARKER, truncate_to_chars};
