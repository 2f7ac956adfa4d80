//! Core types shared across the analysis pipeline.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::{ColumnKind, column_kind};

/// Schema entry for one dataset column.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
    /// Raw polars dtype, kept for generated column descriptions.
    pub dtype: String,
}

/// Ordered column schema, resolved once per analysis from the frame's dtypes.
///
/// Downstream components (profiler, sampler, prompt builder) dispatch on the
/// resolved [`ColumnKind`] tags instead of re-inspecting raw values.
#[derive(Debug, Clone, Default)]
pub struct DatasetSchema {
    pub columns: Vec<ColumnSchema>,
}

impl DatasetSchema {
    /// Resolve the schema of a frame.
    pub fn from_frame(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| ColumnSchema {
                name: c.name().to_string(),
                kind: column_kind(c.dtype()),
                dtype: format!("{:?}", c.dtype()),
            })
            .collect();
        Self { columns }
    }

    /// Names of numeric columns, in frame order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Names of textual/boolean columns, in frame order.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind.is_categorical())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Names of date/datetime columns, in frame order.
    pub fn datetime_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::DateTime)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Whether a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Whether every named column exists.
    pub fn has_all(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.has_column(n))
    }

    /// Whether at least one named column exists.
    pub fn has_any(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.has_column(n))
    }
}

/// One analysis request, as issued by the desktop shell or the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Category labels the user selected; informational, the frame itself is
    /// supplied by the dataset source.
    pub selected_categories: Vec<String>,

    /// Optional free-text directive appended verbatim to the prompt.
    pub user_prompt: String,

    /// When true, the direct path embeds the whole frame as the sample block
    /// (bounded by prompt truncation) instead of drawing a sample. This
    /// matches the desktop shell's behavior for small selections.
    pub full_frame_sample: bool,
}

/// Model response for one partition of an oversized dataset.
/// `index` is the zero-based partition position in original row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    pub index: usize,
    pub text: String,
}

/// Data behind a rendered chart, handed over for AI interpretation.
///
/// Passed explicitly per call; there is no process-wide "latest chart" slot.
#[derive(Debug, Clone)]
pub struct ChartSnapshot {
    pub chart_type: String,
    pub title: String,
    pub frame: DataFrame,
    pub x_col: Option<String>,
    pub y_col: Option<String>,
    pub series_col: Option<String>,
    pub meta: HashMap<String, String>,
}
