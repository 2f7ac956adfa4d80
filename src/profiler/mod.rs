//! Dataset profiling: a bounded, prompt-ready statistical summary.
//!
//! The summary is a markdown document of independent sections. Each section
//! is omitted when its precondition set of columns is empty (no numeric
//! columns means no numeric section), and a date column whose range cannot be
//! computed is skipped without failing the rest of the summary.

mod statistics;

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike};
use polars::prelude::*;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::DatasetSchema;
use crate::utils::{format_float, ranked_value_counts, render_markdown_table};

use statistics::{iqr_outlier_count, mean, numeric_values, percentile, std_dev};

/// Maximum number of columns listed in the missingness table.
const MAX_MISSING_ROWS: usize = 20;

/// Maximum number of categorical columns profiled.
const MAX_CATEGORICAL_COLUMNS: usize = 30;

/// Number of most recent calendar months reported per date column.
const MAX_DATE_MONTHS: usize = 24;

/// Profiler producing condensed markdown summaries of tabular data.
pub struct DatasetProfiler;

impl DatasetProfiler {
    /// Summarize a frame into a bounded markdown document.
    ///
    /// The shape line is always present; every other section appears only
    /// when the frame has matching columns or values.
    pub fn summarize(df: &DataFrame, config: &AnalysisConfig) -> Result<String> {
        let schema = DatasetSchema::from_frame(df);
        let mut sections = vec![Self::shape_section(df)];

        if let Some(section) = Self::missingness_section(df) {
            sections.push(section);
        }
        if let Some(section) = Self::numeric_section(df, &schema).context("numeric profile")? {
            sections.push(section);
        }
        if let Some(section) = Self::outlier_section(df, &schema).context("outlier profile")? {
            sections.push(section);
        }
        if let Some(section) = Self::categorical_section(df, &schema, config.top_n_categories)
            .context("categorical profile")?
        {
            sections.push(section);
        }
        if let Some(section) = Self::date_section(df, &schema) {
            sections.push(section);
        }

        debug!(sections = sections.len(), "dataset summary assembled");
        Ok(sections.join("\n\n"))
    }

    fn shape_section(df: &DataFrame) -> String {
        format!(
            "**Data shape:** {} rows × {} columns",
            df.height(),
            df.width()
        )
    }

    /// Missing-value table covering every column, top 20 by missing count.
    /// Complete columns are listed with a zero count. Omitted only when the
    /// frame has no missing values at all.
    fn missingness_section(df: &DataFrame) -> Option<String> {
        let height = df.height();
        let mut entries: Vec<(String, usize)> = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect();
        if entries.iter().all(|(_, nulls)| *nulls == 0) {
            return None;
        }
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(MAX_MISSING_ROWS);

        let rows: Vec<Vec<String>> = entries
            .into_iter()
            .map(|(name, nulls)| {
                let pct = nulls as f64 / height as f64 * 100.0;
                vec![name, nulls.to_string(), format!("{:.2}", pct)]
            })
            .collect();
        Some(format!(
            "**Missing values (top {}):**\n{}",
            MAX_MISSING_ROWS,
            render_markdown_table(&["column", "missing", "%"], &rows)
        ))
    }

    /// Per-column descriptive statistics for numeric columns.
    fn numeric_section(df: &DataFrame, schema: &DatasetSchema) -> Result<Option<String>> {
        let numeric = schema.numeric_columns();
        if numeric.is_empty() {
            return Ok(None);
        }

        let mut rows = Vec::new();
        for name in numeric {
            let series = df.column(name)?.as_materialized_series();
            let mut values = numeric_values(series)
                .map_err(|e| AnalysisError::SummarizationFailed(e.to_string()))?;
            values.sort_by(|a, b| a.total_cmp(b));

            let quantile = |q: f64| {
                percentile(&values, q)
                    .map(format_float)
                    .unwrap_or_else(|| "-".to_string())
            };
            rows.push(vec![
                name.to_string(),
                values.len().to_string(),
                format_float(mean(&values)),
                format_float(std_dev(&values)),
                quantile(0.0),
                quantile(0.05),
                quantile(0.25),
                quantile(0.5),
                quantile(0.75),
                quantile(0.95),
                quantile(1.0),
            ]);
        }

        Ok(Some(format!(
            "**Numeric statistics:**\n{}",
            render_markdown_table(
                &[
                    "column", "count", "mean", "std", "min", "5%", "25%", "50%", "75%", "95%",
                    "max",
                ],
                &rows,
            )
        )))
    }

    /// IQR-rule outlier notes for numeric columns with at least one outlier.
    fn outlier_section(df: &DataFrame, schema: &DatasetSchema) -> Result<Option<String>> {
        let mut lines = Vec::new();
        for name in schema.numeric_columns() {
            let series = df.column(name)?.as_materialized_series();
            let values = numeric_values(series)
                .map_err(|e| AnalysisError::SummarizationFailed(e.to_string()))?;
            if values.is_empty() {
                continue;
            }
            let outliers = iqr_outlier_count(&values);
            if outliers > 0 {
                let pct = outliers as f64 / values.len() as f64 * 100.0;
                lines.push(format!(
                    "- {}: values outside IQR fences = {} ({:.2}%)",
                    name, outliers, pct
                ));
            }
        }
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!(
            "**Potential outliers (IQR):**\n{}",
            lines.join("\n")
        )))
    }

    /// Frequency tables for textual/boolean columns, first 30 encountered.
    /// Missing values are an explicit category, never silently dropped.
    fn categorical_section(
        df: &DataFrame,
        schema: &DatasetSchema,
        top_n: usize,
    ) -> Result<Option<String>> {
        let categorical = schema.categorical_columns();
        if categorical.is_empty() {
            return Ok(None);
        }

        let mut blocks = Vec::new();
        for name in categorical.into_iter().take(MAX_CATEGORICAL_COLUMNS) {
            let series = df.column(name)?.as_materialized_series();
            let ranked = ranked_value_counts(series);
            let distinct = ranked.len();
            let rows: Vec<Vec<String>> = ranked
                .into_iter()
                .take(top_n)
                .map(|(value, count)| vec![value, count.to_string()])
                .collect();
            blocks.push(format!(
                "**{}** (distinct: {}, top {}):\n{}",
                name,
                distinct,
                top_n,
                render_markdown_table(&["value", "count"], &rows)
            ));
        }

        Ok(Some(format!(
            "**Categorical distributions:**\n{}",
            blocks.join("\n")
        )))
    }

    /// Date ranges and per-month counts for the most recent 24 months present.
    /// A column whose range cannot be computed is skipped; the failure is
    /// local to that column.
    fn date_section(df: &DataFrame, schema: &DatasetSchema) -> Option<String> {
        let datetime_cols = schema.datetime_columns();
        if datetime_cols.is_empty() {
            return None;
        }

        let mut blocks = Vec::new();
        for name in datetime_cols {
            match Self::date_column_block(df, name) {
                Ok(Some(block)) => blocks.push(block),
                Ok(None) => {}
                Err(e) => {
                    debug!(column = name, error = %e, "skipping date column");
                }
            }
        }
        if blocks.is_empty() {
            return None;
        }
        Some(format!("**Date/time fields:**\n{}", blocks.join("\n")))
    }

    fn date_column_block(df: &DataFrame, name: &str) -> Result<Option<String>> {
        let series = df.column(name)?.as_materialized_series();
        let casted = series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let timestamps: Vec<i64> = casted.datetime()?.physical().into_iter().flatten().collect();
        if timestamps.is_empty() {
            return Ok(None);
        }

        let mut by_month: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        let mut min_ts = i64::MAX;
        let mut max_ts = i64::MIN;
        for ts in &timestamps {
            let dt = DateTime::from_timestamp_millis(*ts).ok_or_else(|| {
                AnalysisError::SummarizationFailed(format!(
                    "timestamp out of range in column '{name}'"
                ))
            })?;
            let date = dt.date_naive();
            *by_month.entry((date.year(), date.month())).or_insert(0) += 1;
            min_ts = min_ts.min(*ts);
            max_ts = max_ts.max(*ts);
        }

        let fmt = |ts: i64| {
            DateTime::from_timestamp_millis(ts)
                .map(|dt| dt.date_naive().to_string())
                .unwrap_or_else(|| "-".to_string())
        };

        let month_count = by_month.len();
        let rows: Vec<Vec<String>> = by_month
            .into_iter()
            .skip(month_count.saturating_sub(MAX_DATE_MONTHS))
            .map(|((year, month), count)| {
                vec![format!("{year}-{month:02}"), count.to_string()]
            })
            .collect();

        Ok(Some(format!(
            "**{}**: range {} → {}\nLast {} months:\n{}",
            name,
            fmt(min_ts),
            fmt(max_ts),
            MAX_DATE_MONTHS,
            render_markdown_table(&["month", "rows"], &rows)
        )))
    }
}
