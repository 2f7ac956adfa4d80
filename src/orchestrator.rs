//! Analysis orchestration: single-shot versus map-reduce.
//!
//! The orchestrator routes a dataset through summarize → sample → prompt →
//! model. Datasets above the chunk threshold are partitioned into contiguous
//! chunks, each analyzed independently, and the partial interpretations are
//! consolidated through one merge call. Its public contract never fails:
//! provider errors are captured inline as `[Error]: <message>` markers so
//! partial progress stays visible, and a failed chunk never aborts its
//! siblings.

use std::fmt::Display;
use std::sync::Arc;
use std::thread::JoinHandle;

use polars::prelude::*;
use tracing::{info, warn};

use crate::ai::GenerativeProvider;
use crate::config::AnalysisConfig;
use crate::profiler::DatasetProfiler;
use crate::prompt::PromptBuilder;
use crate::sampler::RepresentativeSampler;
use crate::source::DatasetSource;
use crate::types::{AnalysisRequest, ChartSnapshot, ChunkResult};
use crate::utils::{render_frame_markdown, truncate_to_chars};

/// Report returned when the selection yields no data. No model call is made.
pub const NO_DATA_MESSAGE: &str = "No data available for the selected categories.";

/// Row and column bounds for the chart-data preview block.
const CHART_PREVIEW_ROWS: usize = 20;
const CHART_PREVIEW_COLS: usize = 6;

/// Drives the full analysis pipeline against a generative provider.
///
/// Computation here is synchronous and single-threaded per invocation; the
/// caller is expected to run [`AnalysisOrchestrator::analyze`] from a worker
/// thread (or use [`AnalysisOrchestrator::spawn`]) so an interactive surface
/// stays responsive. Instances hold no mutable state, so one orchestrator can
/// serve concurrent analyses.
pub struct AnalysisOrchestrator {
    config: AnalysisConfig,
    provider: Arc<dyn GenerativeProvider>,
}

impl AnalysisOrchestrator {
    pub fn new(config: AnalysisConfig, provider: Arc<dyn GenerativeProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run one full analysis and return the report text.
    ///
    /// Never returns an error: empty input produces [`NO_DATA_MESSAGE`] and
    /// provider failures are embedded as inline markers.
    pub fn analyze(&self, df: &DataFrame, request: &AnalysisRequest) -> String {
        if df.height() == 0 {
            info!("empty dataset, skipping model call");
            return NO_DATA_MESSAGE.to_string();
        }

        // Boundary is inclusive: exactly chunk_rows rows stay on the direct path.
        if self.config.enable_map_reduce && df.height() > self.config.chunk_rows {
            self.map_reduce(df, request)
        } else {
            self.analyze_direct(df, request)
        }
    }

    /// Fetch the dataset for a category selection and analyze it.
    pub fn analyze_selection(&self, source: &dyn DatasetSource, request: &AnalysisRequest) -> String {
        let df = source.fetch(&request.selected_categories);
        self.analyze(&df, request)
    }

    /// Run the analysis on a background thread and hand the report to
    /// `on_complete`. Once started, the analysis runs to completion or to a
    /// captured failure; cancellation is not supported.
    pub fn spawn(
        self: Arc<Self>,
        df: DataFrame,
        request: AnalysisRequest,
        on_complete: impl FnOnce(String) + Send + 'static,
    ) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let report = self.analyze(&df, &request);
            on_complete(report);
        })
    }

    fn analyze_direct(&self, df: &DataFrame, request: &AnalysisRequest) -> String {
        info!(rows = df.height(), "direct analysis");
        let prompt = self.build_chunk_prompt(df, request);
        self.call_model(&prompt)
    }

    fn map_reduce(&self, df: &DataFrame, request: &AnalysisRequest) -> String {
        let chunk_rows = self.config.chunk_rows;
        let n_chunks = df.height().div_ceil(chunk_rows);
        info!(rows = df.height(), chunks = n_chunks, "map-reduce analysis");

        let mut results = Vec::with_capacity(n_chunks);
        for index in 0..n_chunks {
            let chunk = df.slice((index * chunk_rows) as i64, chunk_rows);
            info!(chunk = index + 1, rows = chunk.height(), "analyzing chunk");
            let prompt = self.build_chunk_prompt(&chunk, request);
            results.push(ChunkResult {
                index,
                text: self.call_model(&prompt),
            });
        }

        let merge_prompt = PromptBuilder::new(&self.config).build_merge(&results);
        self.call_model(&merge_prompt)
    }

    /// Summarize, sample and render the prompt for one frame (the whole
    /// dataset on the direct path, one partition in chunked mode).
    fn build_chunk_prompt(&self, df: &DataFrame, request: &AnalysisRequest) -> String {
        let summary = match DatasetProfiler::summarize(df, &self.config) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "summarization failed");
                error_marker(&e)
            }
        };

        let sample = if request.full_frame_sample {
            Some(df.clone())
        } else {
            let sampler = RepresentativeSampler::new(self.config.sample_seed);
            match sampler.sample(df, self.config.max_sample_rows) {
                Ok(sample) => Some(sample),
                Err(e) => {
                    warn!(error = %e, "sampling failed, prompt built without sample");
                    None
                }
            }
        };

        PromptBuilder::new(&self.config).build(df, request, sample.as_ref(), &summary)
    }

    /// Interpret the data behind a rendered chart.
    ///
    /// The snapshot is passed explicitly per call; provider failures are
    /// captured inline like everywhere else.
    pub fn interpret_chart(&self, snapshot: &ChartSnapshot, user_hint: &str) -> String {
        let prompt = self.build_chart_prompt(snapshot, user_hint);
        self.call_model(&prompt)
    }

    fn build_chart_prompt(&self, snapshot: &ChartSnapshot, user_hint: &str) -> String {
        let axis = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

        let mut meta_entries: Vec<(&String, &String)> = snapshot.meta.iter().collect();
        meta_entries.sort();
        let meta_block = if meta_entries.is_empty() {
            "- none".to_string()
        } else {
            meta_entries
                .iter()
                .map(|(k, v)| format!("- {}: {}", k, v))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let schema_block = snapshot
            .frame
            .get_columns()
            .iter()
            .map(|c| format!("- {}: {:?}", c.name(), c.dtype()))
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = format!(
            "You are a game-data analyst. You are given the data behind a chart.\n\n\
             Chart information:\n\
             - type: {}\n\
             - title: {}\n\
             - X axis: {}\n\
             - Y axis: {}\n\
             - series/category: {}\n\n\
             Metadata:\n{}\n\n\
             Data shape: {} rows × {} columns.\n\
             Column schema:\n{}\n\n\
             Data preview:\n{}\n\
             Task:\n\
             1) Describe the trend/relationships/spread.\n\
             2) Bullet the 2-4 most important observations (with orders of magnitude).\n\
             3) Point out possible anomalies or artifacts.\n\
             4) Propose 2-3 hypotheses and how to verify them.\n\n\
             Do not generate code. Answer in English, concisely, in bullets.\n",
            snapshot.chart_type,
            snapshot.title,
            axis(&snapshot.x_col),
            axis(&snapshot.y_col),
            axis(&snapshot.series_col),
            meta_block,
            snapshot.frame.height(),
            snapshot.frame.width(),
            schema_block,
            render_frame_markdown(
                &snapshot.frame,
                Some(CHART_PREVIEW_ROWS),
                Some(CHART_PREVIEW_COLS)
            ),
        );
        if !user_hint.is_empty() {
            prompt.push_str(&format!("\nUser note: {}\n", user_hint));
        }
        truncate_to_chars(&prompt, self.config.max_prompt_chars)
    }

    fn call_model(&self, prompt: &str) -> String {
        match self.provider.interpret(prompt) {
            Ok(text) => text,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "model call failed");
                error_marker(&e)
            }
        }
    }
}

/// Inline marker that takes a failed step's output slot.
fn error_marker(error: &dyn Display) -> String {
    format!("[Error]: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider double recording every prompt it receives.
    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_on: None,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                fail_on: Some(call),
                ..Self::new()
            }
        }
    }

    impl GenerativeProvider for RecordingProvider {
        fn interpret(&self, prompt: &str) -> anyhow::Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail_on == Some(call) {
                return Err(anyhow!("model unavailable"));
            }
            Ok(format!("interpretation #{}", call + 1))
        }

        fn name(&self) -> &str {
            "Recording"
        }
    }

    fn orchestrator(
        config: AnalysisConfig,
        provider: Arc<RecordingProvider>,
    ) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(config, provider)
    }

    fn frame(rows: usize) -> DataFrame {
        let genres = ["RPG", "Action"];
        df! {
            "price" => (0..rows).map(|i| i as f64).collect::<Vec<_>>(),
            "genres" => (0..rows).map(|i| genres[i % 2]).collect::<Vec<_>>(),
        }
        .unwrap()
    }

    #[test]
    fn test_empty_dataset_skips_model() {
        let provider = Arc::new(RecordingProvider::new());
        let orch = orchestrator(AnalysisConfig::default(), provider.clone());
        let report = orch.analyze(&frame(0), &AnalysisRequest::default());
        assert_eq!(report, NO_DATA_MESSAGE);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_direct_path_single_call() {
        let provider = Arc::new(RecordingProvider::new());
        let config = AnalysisConfig::builder().chunk_rows(100).build().unwrap();
        let orch = orchestrator(config, provider.clone());
        let report = orch.analyze(&frame(50), &AnalysisRequest::default());
        assert_eq!(report, "interpretation #1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let provider = Arc::new(RecordingProvider::new());
        let config = AnalysisConfig::builder().chunk_rows(40).build().unwrap();
        let orch = orchestrator(config, provider.clone());
        // Exactly chunk_rows rows: direct path, one call.
        orch.analyze(&frame(40), &AnalysisRequest::default());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_one_row_over_threshold_chunks() {
        let provider = Arc::new(RecordingProvider::new());
        let config = AnalysisConfig::builder().chunk_rows(40).build().unwrap();
        let orch = orchestrator(config, provider.clone());
        // 41 rows: two chunks plus the merge call.
        orch.analyze(&frame(41), &AnalysisRequest::default());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_map_reduce_chunk_count_and_order() {
        let provider = Arc::new(RecordingProvider::new());
        let config = AnalysisConfig::builder()
            .chunk_rows(50)
            .max_sample_rows(10)
            .build()
            .unwrap();
        let orch = orchestrator(config, provider.clone());
        // 120 rows / 50 per chunk: chunks of 50, 50, 20.
        let report = orch.analyze(&frame(120), &AnalysisRequest::default());

        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        assert_eq!(report, "interpretation #4");

        let prompts = provider.prompts.lock().unwrap();
        let merge = &prompts[3];
        let p1 = merge.find("### Part 1\ninterpretation #1").unwrap();
        let p2 = merge.find("### Part 2\ninterpretation #2").unwrap();
        let p3 = merge.find("### Part 3\ninterpretation #3").unwrap();
        assert!(p1 < p2 && p2 < p3);
        // Final chunk is the 20-row remainder.
        assert!(prompts[2].contains("**Data shape:** 20 rows"));
    }

    #[test]
    fn test_failed_chunk_does_not_abort_siblings() {
        let provider = Arc::new(RecordingProvider::failing_on(0));
        let config = AnalysisConfig::builder().chunk_rows(10).build().unwrap();
        let orch = orchestrator(config, provider.clone());
        let report = orch.analyze(&frame(25), &AnalysisRequest::default());

        // 3 chunks + merge all still happen.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[3].contains("### Part 1\n[Error]: model unavailable"));
        assert!(prompts[3].contains("### Part 2\ninterpretation #2"));
        assert!(!report.starts_with("[Error]"));
    }

    #[test]
    fn test_merge_failure_rendered_inline() {
        let provider = Arc::new(RecordingProvider::failing_on(2));
        let config = AnalysisConfig::builder().chunk_rows(10).build().unwrap();
        let orch = orchestrator(config, provider.clone());
        // 2 chunks, then a failing merge call.
        let report = orch.analyze(&frame(15), &AnalysisRequest::default());
        assert_eq!(report, "[Error]: model unavailable");
    }

    #[test]
    fn test_direct_failure_rendered_inline() {
        let provider = Arc::new(RecordingProvider::failing_on(0));
        let orch = orchestrator(AnalysisConfig::default(), provider);
        let report = orch.analyze(&frame(5), &AnalysisRequest::default());
        assert_eq!(report, "[Error]: model unavailable");
    }

    #[test]
    fn test_map_reduce_disabled_stays_direct() {
        let provider = Arc::new(RecordingProvider::new());
        let config = AnalysisConfig::builder()
            .chunk_rows(10)
            .enable_map_reduce(false)
            .build()
            .unwrap();
        let orch = orchestrator(config, provider.clone());
        orch.analyze(&frame(100), &AnalysisRequest::default());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_full_frame_sample_embeds_all_rows() {
        let provider = Arc::new(RecordingProvider::new());
        let orch = orchestrator(AnalysisConfig::default(), provider.clone());
        let request = AnalysisRequest {
            full_frame_sample: true,
            ..Default::default()
        };
        orch.analyze(&frame(4), &request);
        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("**Sample rows"));
        // All four distinct prices appear in the sample block.
        for price in ["| 0 |", "| 1 |", "| 2 |", "| 3 |"] {
            assert!(prompts[0].contains(price));
        }
    }

    #[test]
    fn test_spawn_reports_asynchronously() {
        let provider = Arc::new(RecordingProvider::new());
        let orch = Arc::new(orchestrator(AnalysisConfig::default(), provider));
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = orch.spawn(frame(3), AnalysisRequest::default(), move |report| {
            tx.send(report).unwrap();
        });
        let report = rx.recv().unwrap();
        handle.join().unwrap();
        assert_eq!(report, "interpretation #1");
    }

    #[test]
    fn test_chart_interpretation_prompt() {
        let provider = Arc::new(RecordingProvider::new());
        let orch = orchestrator(AnalysisConfig::default(), provider.clone());
        let snapshot = ChartSnapshot {
            chart_type: "scatter".to_string(),
            title: "Price vs play time".to_string(),
            frame: frame(6),
            x_col: Some("price".to_string()),
            y_col: None,
            series_col: None,
            meta: HashMap::from([("source".to_string(), "library".to_string())]),
        };
        let report = orch.interpret_chart(&snapshot, "check the outlier");
        assert_eq!(report, "interpretation #1");
        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("- type: scatter"));
        assert!(prompts[0].contains("- X axis: price"));
        assert!(prompts[0].contains("- Y axis: -"));
        assert!(prompts[0].contains("- source: library"));
        assert!(prompts[0].contains("User note: check the outlier"));
    }
}
