//! Prompt assembly for the generative model.
//!
//! One builder renders the natural-language request from the column
//! description block, a static context preamble, the relationship checklist,
//! the profiler's summary, sampled rows and the optional user directive. The
//! final text never exceeds the configured character budget; the same hard
//! truncation applies to the map-reduce merge prompt.

mod registry;

pub use registry::{CHECKLIST_RULES, COLUMN_DESCRIPTIONS, ChecklistRule, applicable_hints};

use polars::prelude::*;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::types::{AnalysisRequest, ChunkResult, DatasetSchema};
use crate::utils::{render_frame_markdown, truncate_to_chars};

/// Fixed explanatory preamble stating analysis goals and response-format
/// preferences.
const PROJECT_CONTEXT: &str = "\
Project context and expectations:
- We analyze player/game-sales data to: (a) understand drivers of popularity and engagement, \
(b) detect anomalies and data-quality problems, (c) derive practical conclusions and hypotheses.
- If something is missing or cannot be inferred, say so explicitly.
- Preferred form: short sections with headings and bullet points; give numbers with their order of magnitude.";

/// Fixed multi-step task instruction block.
const TASK_INSTRUCTIONS: &str = "\
Your task: perform a detailed analysis following the steps below.

1. **Data description**
- List the columns and briefly describe what they contain.
- State the number of rows and columns.
- State the share of missing values in each column (%).

2. **Numeric analysis**
- For each numeric column give: mean, median, min, max, standard deviation, 5th and 95th percentile.
- Identify outliers using the IQR method and list a few examples (e.g. game titles if a title column exists).

3. **Categorical analysis**
- Give the number of distinct values and the TOP 5 most frequent.
- If genre/platform/language columns exist, compare numeric column averages across those groups.

4. **Date analysis**
- Give the date range and the average gap between dates.
- If date columns exist, describe how other variables change over time.

5. **Correlations and relationships**
- Check correlations between numeric columns and list the TOP 5 positive and negative ones.
- Describe what they could mean in a gaming context.

6. **Conclusions and recommendations**
- List the 3-5 most important conclusions.
- If there are anomalies, point at their possible causes.
- Suggest what additional data could improve the analysis.

Rules:
- Do not generate charts.
- Do not guess — if data is missing, say so.
- Answer in English, in bullet points.";

/// Fixed instruction for consolidating partial chunk analyses.
const MERGE_INSTRUCTIONS: &str = "\
You are given partial AI analyses of consecutive partitions of one dataset (below).
Merge them into a single coherent report, eliminating repetition and highlighting \
shared findings as well as exceptions between partitions.";

const MERGE_OUTPUT_FORMAT: &str = "\
Return sections: Key findings, Relationships, Anomalies, Recommendations. \
Be concise, answer in English.";

/// Assembles size-bounded prompts for the generative model.
pub struct PromptBuilder<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Build the full analysis prompt for one frame.
    ///
    /// `summary` is embedded verbatim (the orchestrator passes the profiler's
    /// output, or a chunk-local equivalent in chunked mode). The sample block
    /// is omitted entirely when `sample` is absent or empty. The result never
    /// exceeds `max_prompt_chars` characters.
    pub fn build(
        &self,
        df: &DataFrame,
        request: &AnalysisRequest,
        sample: Option<&DataFrame>,
        summary: &str,
    ) -> String {
        let schema = DatasetSchema::from_frame(df);
        let mut prompt = String::new();

        prompt.push_str("You are given a tabular dataset with the following columns:\n");
        prompt.push_str(&Self::column_description_block(&schema));
        prompt.push_str("\n\n");

        if !request.selected_categories.is_empty() {
            prompt.push_str(&format!(
                "Categories selected by the user: {}\n\n",
                request.selected_categories.join(", ")
            ));
        }

        prompt.push_str(PROJECT_CONTEXT);
        prompt.push_str("\n\n");

        let hints = applicable_hints(&schema);
        if !hints.is_empty() {
            prompt.push_str("**Relationships especially worth a look:**\n- ");
            prompt.push_str(&hints.join("\n- "));
            prompt.push_str("\n\n");
        }

        prompt.push_str("**Data summary (condensed):**\n");
        prompt.push_str(summary);
        prompt.push_str("\n\n");

        if let Some(sample) = sample.filter(|s| s.height() > 0) {
            prompt.push_str("**Sample rows (representative subset, not the full data):**\n");
            prompt.push_str(&render_frame_markdown(sample, None, None));
            prompt.push_str("\n\n");
        }

        prompt.push_str(TASK_INSTRUCTIONS);

        if !request.user_prompt.is_empty() {
            prompt.push_str("\n\nThe user added a directive: ");
            prompt.push_str(&request.user_prompt);
        }

        self.finish(prompt)
    }

    /// Build the merge prompt consolidating chunk results, labeled in
    /// partition order.
    pub fn build_merge(&self, chunk_results: &[ChunkResult]) -> String {
        let mut prompt = String::new();
        prompt.push_str(MERGE_INSTRUCTIONS);
        prompt.push_str("\n\nPartial analyses:\n------------------\n");
        for result in chunk_results {
            prompt.push_str(&format!("### Part {}\n{}\n\n", result.index + 1, result.text));
        }
        prompt.push_str(MERGE_OUTPUT_FORMAT);
        self.finish(prompt)
    }

    /// One description line per column: registry text for known columns, a
    /// generated fallback noting the inferred kind for the rest.
    fn column_description_block(schema: &DatasetSchema) -> String {
        schema
            .columns
            .iter()
            .map(|col| match COLUMN_DESCRIPTIONS.get(col.name.as_str()) {
                Some(desc) => format!("- {}: {}", col.name, desc),
                None => format!(
                    "- {}: no description available ({} column, dtype {})",
                    col.name,
                    col.kind.label(),
                    col.dtype
                ),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn finish(&self, prompt: String) -> String {
        let bounded = truncate_to_chars(&prompt, self.config.max_prompt_chars);
        if bounded.len() != prompt.len() {
            debug!(
                budget = self.config.max_prompt_chars,
                "prompt truncated to character budget"
            );
        }
        bounded
    }
}
