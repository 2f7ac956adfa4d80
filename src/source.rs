//! Dataset source seam.
//!
//! The analysis core never queries storage itself; a [`DatasetSource`]
//! collaborator supplies the frame for the user's category selection. The
//! desktop shell plugs in its SQL-backed source; [`CsvSource`] backs the CLI
//! and tests.

use std::path::PathBuf;

use polars::chunked_array::cast::CastOptions;
use polars::prelude::*;
use tracing::warn;

/// Supplies a dataset for a set of selected category labels.
///
/// Implementations must not propagate failures: on any error (connectivity,
/// bad file, unknown categories) they return an empty frame, which the
/// orchestrator reports as "no data for selection" without invoking the
/// generative model.
pub trait DatasetSource {
    fn fetch(&self, selected: &[String]) -> DataFrame;
}

/// CSV-backed dataset source.
///
/// Category labels are interpreted as column names; an empty selection or any
/// read failure yields an empty frame. String columns whose name contains
/// "date" are coerced to dates, mirroring what the query layer does for SQL
/// results.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> PolarsResult<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(self.path.clone()))?
            .finish()?;
        Ok(coerce_date_columns(df))
    }
}

impl DatasetSource for CsvSource {
    fn fetch(&self, selected: &[String]) -> DataFrame {
        if selected.is_empty() {
            return DataFrame::empty();
        }
        let df = match self.load() {
            Ok(df) => df,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "CSV load failed");
                return DataFrame::empty();
            }
        };
        let present: Vec<&str> = selected
            .iter()
            .map(String::as_str)
            .filter(|name| df.get_column_names().iter().any(|c| c.as_str() == *name))
            .collect();
        if present.is_empty() {
            return DataFrame::empty();
        }
        df.select(present).unwrap_or_else(|e| {
            warn!(error = %e, "column selection failed");
            DataFrame::empty()
        })
    }
}

/// Parse string columns whose name contains "date" into date columns.
/// Values that fail to parse become missing; a column that cannot be coerced
/// at all is left unchanged.
pub fn coerce_date_columns(mut df: DataFrame) -> DataFrame {
    let candidates: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| {
            c.name().to_lowercase().contains("date") && matches!(c.dtype(), DataType::String)
        })
        .map(|c| c.name().to_string())
        .collect();

    for name in candidates {
        let series = match df.column(&name) {
            Ok(col) => col.as_materialized_series().clone(),
            Err(_) => continue,
        };
        match series.cast_with_options(&DataType::Date, CastOptions::NonStrict) {
            Ok(parsed) => {
                if df.replace(&name, parsed).is_err() {
                    warn!(column = %name, "failed to install parsed date column");
                }
            }
            Err(e) => {
                warn!(column = %name, error = %e, "date coercion skipped");
            }
        }
    }
    df
}
