//! Representative sampling under a strict row budget.
//!
//! The sampler draws a deduplicated subset of rows through three tiers that
//! share one remaining-budget counter: stratified draws over priority
//! categorical columns, quantile-binned draws over the first numeric column,
//! then a uniform remainder. All draws are seeded, so identical inputs yield
//! identical samples.

use polars::prelude::*;
use rand::prelude::*;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::types::DatasetSchema;
use crate::utils::{ColumnKind, ranked_value_counts, string_values_with_missing};

/// Categorical columns used for stratification, in priority order.
pub const STRATIFY_PRIORITY: [&str; 2] = ["genres", "creator"];

/// Number of most frequent values stratified per column.
const TOP_STRATA_VALUES: usize = 10;

/// Minimum rows requested per stratum (before clamping to the stratum size
/// and the remaining budget).
const STRATUM_FLOOR: usize = 5;

/// Minimum rows requested per quantile bin (same clamping).
const BIN_FLOOR: usize = 10;

/// Quantile cut points for the numeric tier.
const BIN_QUANTILES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Seeded, tiered sampler producing bounded representative subsets.
pub struct RepresentativeSampler {
    seed: u64,
}

impl RepresentativeSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Draw at most `target_rows` representative rows from `df`.
    ///
    /// The result is a new frame whose rows all exist verbatim in `df`, with
    /// exact-duplicate rows removed and row count capped at `target_rows`.
    /// Any internal frame operation that fails surfaces as
    /// [`AnalysisError::SamplingFailed`].
    pub fn sample(&self, df: &DataFrame, target_rows: usize) -> Result<DataFrame> {
        self.sample_rows(df, target_rows).map_err(sampling_error)
    }

    fn sample_rows(&self, df: &DataFrame, target_rows: usize) -> PolarsResult<DataFrame> {
        let height = df.height();
        if height == 0 || target_rows == 0 {
            return Ok(df.head(Some(0)));
        }

        let schema = DatasetSchema::from_frame(df);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut budget = target_rows;
        let mut picked: Vec<IdxSize> = Vec::new();

        self.stratified_tier(df, &schema, &mut rng, &mut budget, &mut picked)?;
        if budget > 0 {
            self.quantile_tier(df, &schema, &mut rng, &mut budget, &mut picked)?;
        }
        if budget > 0 {
            let all: Vec<IdxSize> = (0..height as IdxSize).collect();
            let take = budget.min(height);
            picked.extend(all.choose_multiple(&mut rng, take).copied());
        }

        if picked.is_empty() {
            // No tier produced anything; fall back to a plain prefix.
            return Ok(df.head(Some(target_rows.min(height))));
        }

        let indices = IdxCa::from_vec("idx".into(), picked);
        let drawn = df.take(&indices)?;
        let deduped = drawn.unique_stable(None, UniqueKeepStrategy::First, None)?;
        debug!(
            drawn = drawn.height(),
            deduped = deduped.height(),
            target = target_rows,
            "sample assembled"
        );
        Ok(deduped.head(Some(target_rows)))
    }

    /// Tier 1: proportional draws from the top values of each priority
    /// categorical column present in the frame.
    fn stratified_tier(
        &self,
        df: &DataFrame,
        schema: &DatasetSchema,
        rng: &mut StdRng,
        budget: &mut usize,
        picked: &mut Vec<IdxSize>,
    ) -> PolarsResult<()> {
        for col_name in STRATIFY_PRIORITY {
            if *budget == 0 {
                break;
            }
            let known = schema
                .columns
                .iter()
                .find(|c| c.name == col_name && c.kind.is_categorical());
            if known.is_none() {
                continue;
            }

            let series = df.column(col_name)?.as_materialized_series();
            let labels = string_values_with_missing(series);
            let top_values: Vec<String> = ranked_value_counts(series)
                .into_iter()
                .take(TOP_STRATA_VALUES)
                .map(|(value, _)| value)
                .collect();
            let n_values = top_values.len().max(1);

            for value in top_values {
                if *budget == 0 {
                    break;
                }
                let members: Vec<IdxSize> = labels
                    .iter()
                    .enumerate()
                    .filter(|(_, label)| **label == value)
                    .map(|(i, _)| i as IdxSize)
                    .collect();
                // Clamp so the budget counter never goes negative even when
                // the floor exceeds the even split.
                let desired = STRATUM_FLOOR.max(*budget / n_values);
                let take = desired.min(members.len()).min(*budget);
                if take > 0 {
                    picked.extend(members.choose_multiple(rng, take).copied());
                    *budget -= take;
                }
            }
        }
        Ok(())
    }

    /// Tier 2: draws spread over quantile bins of the first numeric column.
    /// Bin bounds are inclusive, so boundary rows may belong to two bins;
    /// duplicates are removed in post-processing.
    fn quantile_tier(
        &self,
        df: &DataFrame,
        schema: &DatasetSchema,
        rng: &mut StdRng,
        budget: &mut usize,
        picked: &mut Vec<IdxSize>,
    ) -> PolarsResult<()> {
        let Some(key) = schema
            .columns
            .iter()
            .find(|c| c.kind == ColumnKind::Numeric)
        else {
            return Ok(());
        };

        let casted = df
            .column(&key.name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = casted.f64()?.into_iter().collect();
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        if sorted.is_empty() {
            return Ok(());
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut cuts: Vec<f64> = BIN_QUANTILES
            .iter()
            .map(|q| {
                let pos = q * (sorted.len() - 1) as f64;
                sorted[pos.round() as usize]
            })
            .collect();
        cuts.dedup_by(|a, b| a.total_cmp(b).is_eq());
        if cuts.len() < 2 {
            return Ok(());
        }

        let n_bins = cuts.len() - 1;
        let per_bin = BIN_FLOOR.max(*budget / n_bins);
        for bin in 0..n_bins {
            if *budget == 0 {
                break;
            }
            let (lo, hi) = (cuts[bin], cuts[bin + 1]);
            let members: Vec<IdxSize> = values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_some_and(|v| v >= lo && v <= hi))
                .map(|(i, _)| i as IdxSize)
                .collect();
            let take = per_bin.min(members.len()).min(*budget);
            if take > 0 {
                picked.extend(members.choose_multiple(rng, take).copied());
                *budget -= take;
            }
        }
        Ok(())
    }
}

/// Classifies a frame-operation failure as a sampling failure.
fn sampling_error(e: PolarsError) -> AnalysisError {
    AnalysisError::SamplingFailed(e.to_string())
}
