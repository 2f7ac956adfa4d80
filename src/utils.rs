//! Shared utilities for the analysis pipeline.
//!
//! Dtype categorization, value/table rendering for prompt embedding, and the
//! character-budget truncation used by every outgoing prompt.

use polars::prelude::*;

// =============================================================================
// Column Kind
// =============================================================================

/// Semantic kind of a column, resolved once per analysis from its dtype.
///
/// All downstream components dispatch on this tag instead of re-inspecting
/// raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// String/text type, treated as categorical
    Textual,
    /// Boolean type, treated as categorical
    Boolean,
    /// Date or datetime types
    DateTime,
    /// Anything else (nested lists, structs, ...)
    Other,
}

impl ColumnKind {
    /// Whether the column participates in categorical distributions.
    pub fn is_categorical(self) -> bool {
        matches!(self, ColumnKind::Textual | ColumnKind::Boolean)
    }

    /// Human-readable label used in generated column descriptions.
    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Textual => "text",
            ColumnKind::Boolean => "boolean",
            ColumnKind::DateTime => "date/time",
            ColumnKind::Other => "other",
        }
    }
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Get the semantic kind of a DataType.
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else if is_datetime_dtype(dtype) {
        ColumnKind::DateTime
    } else if matches!(dtype, DataType::Boolean) {
        ColumnKind::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        ColumnKind::Textual
    } else {
        ColumnKind::Other
    }
}

/// Get the semantic kind of a Series.
pub fn series_kind(series: &Series) -> ColumnKind {
    column_kind(series.dtype())
}

// =============================================================================
// Value Rendering
// =============================================================================

/// Label used for missing values when they are reported as their own category.
pub const MISSING_LABEL: &str = "<missing>";

/// Render a single cell value for embedding into a prompt table.
///
/// Nulls render as [`MISSING_LABEL`]; floats are shortened to at most two
/// decimal places so sample tables stay compact.
pub fn format_any_value(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => MISSING_LABEL.to_string(),
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float32(f) => format_float(*f as f64),
        AnyValue::Float64(f) => format_float(*f),
        other => format!("{}", other),
    }
}

/// Compact float rendering: integral values without a fraction, everything
/// else with two decimals.
pub fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Render a string column where nulls become an explicit missing category.
pub fn string_values_with_missing(series: &Series) -> Vec<String> {
    (0..series.len())
        .map(|i| match series.get(i) {
            Ok(v) => format_any_value(&v),
            Err(_) => MISSING_LABEL.to_string(),
        })
        .collect()
}

/// Frequency table of a column's rendered values, missing included as its own
/// category. Sorted by descending count, ties broken lexically so the order
/// is stable across runs.
pub fn ranked_value_counts(series: &Series) -> Vec<(String, usize)> {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for value in string_values_with_missing(series) {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

// =============================================================================
// Markdown Tables
// =============================================================================

/// Render a markdown-style table from headers and pre-formatted rows.
pub fn render_markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&headers.join(" | "));
    out.push_str(" |\n|");
    for _ in headers {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in rows {
        out.push_str("| ");
        out.push_str(&row.join(" | "));
        out.push_str(" |\n");
    }
    out
}

/// Render a DataFrame as a markdown table, optionally bounded in rows and
/// columns. Used for sample blocks and chart previews.
pub fn render_frame_markdown(
    df: &DataFrame,
    max_rows: Option<usize>,
    max_cols: Option<usize>,
) -> String {
    let n_cols = max_cols.map_or(df.width(), |m| m.min(df.width()));
    let n_rows = max_rows.map_or(df.height(), |m| m.min(df.height()));

    let columns = &df.get_columns()[..n_cols];
    let headers: Vec<&str> = columns.iter().map(|c| c.name().as_str()).collect();

    let mut rows = Vec::with_capacity(n_rows);
    for i in 0..n_rows {
        let row: Vec<String> = columns
            .iter()
            .map(|c| match c.get(i) {
                Ok(v) => format_any_value(&v),
                Err(_) => MISSING_LABEL.to_string(),
            })
            .collect();
        rows.push(row);
    }
    render_markdown_table(&headers, &rows)
}

// =============================================================================
// Prompt Truncation
// =============================================================================

/// Marker appended in place of removed text when a prompt is shortened.
pub const TRUNCATION_MARKER: &str = "\n\n...[truncated to size limit]";

/// Shorten `text` to at most `max_chars` characters (not bytes).
///
/// Preserves the longest possible prefix and appends [`TRUNCATION_MARKER`].
/// Idempotent: text already within the budget is returned unchanged, so
/// re-truncating a truncated prompt is a no-op.
pub fn truncate_to_chars(text: &str, max_chars: usize) -> String {
    let len = text.chars().count();
    if len <= max_chars {
        return text.to_string();
    }
    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        // Degenerate budget: no room for the marker.
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
