//! Integration tests for the analysis pipeline.
//!
//! These verify end-to-end behavior (routing, chunk ordering, failure
//! capture and prompt invariants) using a recording provider double in place
//! of a live model.

use anyhow::anyhow;
use gamesight::ai::GenerativeProvider;
use gamesight::{
    AnalysisConfig, AnalysisOrchestrator, AnalysisRequest, CsvSource, DatasetSource,
    NO_DATA_MESSAGE, TRUNCATION_MARKER,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_sales_subset() -> DataFrame {
    CsvSource::new(fixtures_path().join("sales_subset.csv")).fetch(&[
        "price".to_string(),
        "genres".to_string(),
        "play_time".to_string(),
        "purchase_date".to_string(),
        "creator".to_string(),
    ])
}

fn synthetic_frame(rows: usize) -> DataFrame {
    let genres = ["RPG", "Action", "Strategy"];
    df! {
        "price" => (0..rows).map(|i| (i % 70) as f64).collect::<Vec<_>>(),
        "genres" => (0..rows).map(|i| genres[i % 3]).collect::<Vec<_>>(),
        "play_time" => (0..rows).map(|i| (i * 13) as i64).collect::<Vec<_>>(),
    }
    .unwrap()
}

/// Provider double that records prompts and can fail specific calls.
struct MockProvider {
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    fail_calls: Vec<usize>,
}

impl MockProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_calls: Vec::new(),
        })
    }

    fn failing(fail_calls: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_calls,
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

impl GenerativeProvider for MockProvider {
    fn interpret(&self, prompt: &str) -> anyhow::Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_calls.contains(&call) {
            return Err(anyhow!("connection refused"));
        }
        Ok(format!("response {}", call + 1))
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

// ============================================================================
// Direct Path
// ============================================================================

#[test]
fn test_fixture_runs_through_direct_path() {
    let provider = MockProvider::new();
    let orchestrator =
        AnalysisOrchestrator::new(AnalysisConfig::default(), provider.clone());

    let df = load_sales_subset();
    assert_eq!(df.height(), 12);

    let report = orchestrator.analyze(&df, &AnalysisRequest::default());
    assert_eq!(report, "response 1");
    assert_eq!(provider.call_count(), 1);

    let prompt = provider.prompt(0);
    // Column descriptions from the registry
    assert!(prompt.contains("- price: price (float)"));
    assert!(prompt.contains("- creator: studio/creator name"));
    // Profiler sections
    assert!(prompt.contains("**Data shape:** 12 rows × 5 columns"));
    assert!(prompt.contains("**Numeric statistics:**"));
    assert!(prompt.contains("**Categorical distributions:**"));
    // purchase_date was coerced by the CSV source and profiled as a date
    assert!(prompt.contains("**Date/time fields:**"));
    assert!(prompt.contains("range 2024-01-05 → 2024-05-23"));
    // Relationship checklist fired for play_time + genres
    assert!(prompt.contains("**Relationships especially worth a look:**"));
    assert!(prompt.contains("play_time"));
    // Sample rows present
    assert!(prompt.contains("**Sample rows"));
}

#[test]
fn test_missing_values_surface_in_summary() {
    let provider = MockProvider::new();
    let orchestrator =
        AnalysisOrchestrator::new(AnalysisConfig::default(), provider.clone());

    orchestrator.analyze(&load_sales_subset(), &AnalysisRequest::default());
    let prompt = provider.prompt(0);
    assert!(prompt.contains("**Missing values (top 20):**"));
    // creator has one empty cell, reported as a missing category downstream
    assert!(prompt.contains("| creator | 1 |"));
    // fully populated columns are listed with a zero count
    assert!(prompt.contains("| price | 0 | 0.00 |"));
}

#[test]
fn test_user_prompt_and_categories_flow_through() {
    let provider = MockProvider::new();
    let orchestrator =
        AnalysisOrchestrator::new(AnalysisConfig::default(), provider.clone());

    let request = AnalysisRequest {
        selected_categories: vec!["price".to_string(), "genres".to_string()],
        user_prompt: "compare price tiers".to_string(),
        full_frame_sample: false,
    };
    orchestrator.analyze(&synthetic_frame(20), &request);

    let prompt = provider.prompt(0);
    assert!(prompt.contains("Categories selected by the user: price, genres"));
    assert!(prompt.trim_end().ends_with("compare price tiers"));
}

// ============================================================================
// Empty Input
// ============================================================================

#[test]
fn test_empty_selection_produces_no_data_report() {
    let provider = MockProvider::new();
    let orchestrator =
        AnalysisOrchestrator::new(AnalysisConfig::default(), provider.clone());

    let source = CsvSource::new(fixtures_path().join("sales_subset.csv"));
    let report = orchestrator.analyze_selection(&source, &AnalysisRequest::default());

    assert_eq!(report, NO_DATA_MESSAGE);
    assert_eq!(provider.call_count(), 0);
}

#[test]
fn test_unreadable_source_produces_no_data_report() {
    let provider = MockProvider::new();
    let orchestrator =
        AnalysisOrchestrator::new(AnalysisConfig::default(), provider.clone());

    let source = CsvSource::new("/no/such/file.csv");
    let request = AnalysisRequest {
        selected_categories: vec!["price".to_string()],
        ..Default::default()
    };
    let report = orchestrator.analyze_selection(&source, &request);

    assert_eq!(report, NO_DATA_MESSAGE);
    assert_eq!(provider.call_count(), 0);
}

// ============================================================================
// Map-Reduce Path
// ============================================================================

#[test]
fn test_chunked_analysis_partitions_and_merges_in_order() {
    let provider = MockProvider::new();
    let config = AnalysisConfig::builder()
        .chunk_rows(50)
        .max_sample_rows(20)
        .build()
        .unwrap();
    let orchestrator = AnalysisOrchestrator::new(config, provider.clone());

    // 120 rows at 50 per chunk: 50 / 50 / 20, then one merge call.
    let report = orchestrator.analyze(&synthetic_frame(120), &AnalysisRequest::default());

    assert_eq!(provider.call_count(), 4);
    assert_eq!(report, "response 4");

    assert!(provider.prompt(0).contains("**Data shape:** 50 rows"));
    assert!(provider.prompt(1).contains("**Data shape:** 50 rows"));
    assert!(provider.prompt(2).contains("**Data shape:** 20 rows"));

    let merge = provider.prompt(3);
    let p1 = merge.find("### Part 1\nresponse 1").unwrap();
    let p2 = merge.find("### Part 2\nresponse 2").unwrap();
    let p3 = merge.find("### Part 3\nresponse 3").unwrap();
    assert!(p1 < p2 && p2 < p3);
    assert!(merge.contains("Key findings, Relationships, Anomalies, Recommendations"));
}

#[test]
fn test_routing_boundary_is_inclusive() {
    let provider = MockProvider::new();
    let config = AnalysisConfig::builder().chunk_rows(60).build().unwrap();
    let orchestrator = AnalysisOrchestrator::new(config, provider.clone());

    orchestrator.analyze(&synthetic_frame(60), &AnalysisRequest::default());
    assert_eq!(provider.call_count(), 1, "exact threshold stays direct");

    let provider = MockProvider::new();
    let config = AnalysisConfig::builder().chunk_rows(60).build().unwrap();
    let orchestrator = AnalysisOrchestrator::new(config, provider.clone());

    orchestrator.analyze(&synthetic_frame(61), &AnalysisRequest::default());
    assert_eq!(provider.call_count(), 3, "one row over goes chunked");
}

#[test]
fn test_every_call_failing_still_yields_report() {
    let provider = MockProvider::failing(vec![0, 1, 2, 3]);
    let config = AnalysisConfig::builder().chunk_rows(30).build().unwrap();
    let orchestrator = AnalysisOrchestrator::new(config, provider.clone());

    let report = orchestrator.analyze(&synthetic_frame(90), &AnalysisRequest::default());

    // All three chunk calls and the merge call were attempted.
    assert_eq!(provider.call_count(), 4);
    // Merge input carried the inline markers for every failed chunk.
    let merge = provider.prompt(3);
    assert!(merge.contains("### Part 1\n[Error]: connection refused"));
    assert!(merge.contains("### Part 3\n[Error]: connection refused"));
    // The merge call itself failed, so the report is its marker.
    assert_eq!(report, "[Error]: connection refused");
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_prompts_never_exceed_budget() {
    let provider = MockProvider::new();
    let config = AnalysisConfig::builder()
        .chunk_rows(40)
        .max_prompt_chars(3_000)
        .build()
        .unwrap();
    let orchestrator = AnalysisOrchestrator::new(config, provider.clone());

    orchestrator.analyze(&synthetic_frame(200), &AnalysisRequest::default());

    let prompts = provider.prompts.lock().unwrap();
    assert!(!prompts.is_empty());
    for prompt in prompts.iter() {
        assert!(prompt.chars().count() <= 3_000);
    }
    // At least the chunk prompts had to be shortened for this budget.
    assert!(prompts.iter().any(|p| p.ends_with(TRUNCATION_MARKER)));
}

#[test]
fn test_identical_runs_build_identical_prompts() {
    let run = || {
        let provider = MockProvider::new();
        let orchestrator =
            AnalysisOrchestrator::new(AnalysisConfig::default(), provider.clone());
        orchestrator.analyze(&synthetic_frame(300), &AnalysisRequest::default());
        provider.prompt(0)
    };
    assert_eq!(run(), run());
}
