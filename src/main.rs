//! CLI entry point for the analysis pipeline.
//!
//! Loads a CSV, runs the same orchestration the desktop shell uses, and
//! prints the report. `--no-ai` prints the assembled prompt instead of
//! calling a model, which is handy without a running Ollama instance.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use gamesight::{
    AnalysisConfig, AnalysisOrchestrator, AnalysisRequest, CsvSource, DatasetProfiler,
    DatasetSource, PromptBuilder, RepresentativeSampler,
};
use polars::prelude::*;
use tracing::info;

#[cfg(feature = "ai")]
use gamesight::ai::{OllamaConfig, OllamaProvider};
#[cfg(feature = "ai")]
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "AI-assisted interpretation of game-sales datasets",
    long_about = "Summarizes a tabular dataset, draws a representative sample, builds a \
                  size-bounded prompt and asks a locally hosted model for an interpretation.\n\n\
                  EXAMPLES:\n  \
                  # Analyze a CSV with a local Ollama model\n  \
                  gamesight -i sales.csv\n\n  \
                  # Restrict to selected columns and add a directive\n  \
                  gamesight -i sales.csv -c price,genres -p \"focus on indie titles\"\n\n  \
                  # Print the prompt without calling a model\n  \
                  gamesight -i sales.csv --no-ai"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Comma-separated column selection (default: all columns)
    #[arg(short, long)]
    categories: Option<String>,

    /// Free-text directive appended to the prompt
    #[arg(short, long, default_value = "")]
    prompt: String,

    /// Model identifier for the local Ollama instance
    #[arg(short, long, default_value = "mistral")]
    model: String,

    /// Ollama chat endpoint URL
    #[arg(long, default_value = "http://localhost:11434/api/chat")]
    ollama_url: String,

    /// Chunk size (rows) for the map-reduce path
    #[arg(long, default_value_t = 50_000)]
    chunk_rows: usize,

    /// Row cap for the representative sample
    #[arg(long, default_value_t = 800)]
    sample_rows: usize,

    /// Hard character budget for prompts
    #[arg(long, default_value_t = 120_000)]
    max_prompt_chars: usize,

    /// Sampling seed (fixed default for reproducible prompts)
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Disable chunked map-reduce for oversized datasets
    #[arg(long)]
    no_map_reduce: bool,

    /// Embed the whole frame as the sample block instead of sampling
    #[arg(long)]
    full_sample: bool,

    /// Build and print the prompt without calling a model
    #[arg(long)]
    no_ai: bool,
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = AnalysisConfig::builder()
        .chunk_rows(args.chunk_rows)
        .max_sample_rows(args.sample_rows)
        .max_prompt_chars(args.max_prompt_chars)
        .sample_seed(args.seed)
        .enable_map_reduce(!args.no_map_reduce)
        .model(args.model.clone())
        .build()
        .map_err(|e| anyhow!("invalid configuration: {e}"))?;

    let df = load_frame(&args)?;
    info!(rows = df.height(), columns = df.width(), "dataset loaded");

    let request = AnalysisRequest {
        selected_categories: selected_categories(&args),
        user_prompt: args.prompt.clone(),
        full_frame_sample: args.full_sample,
    };

    if args.no_ai {
        print_prompt_only(&df, &request, &config)?;
        return Ok(());
    }

    run_analysis(df, request, config, &args)
}

fn selected_categories(args: &Args) -> Vec<String> {
    args.categories
        .as_deref()
        .map(|list| {
            list.split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn load_frame(args: &Args) -> Result<DataFrame> {
    let source = CsvSource::new(&args.input);
    let selected = selected_categories(args);
    if !selected.is_empty() {
        return Ok(source.fetch(&selected));
    }
    // No selection: take every column the file has.
    let all_columns = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(args.input.clone().into()))?
        .finish()?
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>();
    Ok(source.fetch(&all_columns))
}

/// Build and print the prompt the model would receive.
fn print_prompt_only(df: &DataFrame, request: &AnalysisRequest, config: &AnalysisConfig) -> Result<()> {
    let summary = DatasetProfiler::summarize(df, config)?;
    let sample = if request.full_frame_sample {
        df.clone()
    } else {
        RepresentativeSampler::new(config.sample_seed).sample(df, config.max_sample_rows)?
    };
    let prompt = PromptBuilder::new(config).build(df, request, Some(&sample), &summary);
    println!("{prompt}");
    Ok(())
}

#[cfg(feature = "ai")]
fn run_analysis(
    df: DataFrame,
    request: AnalysisRequest,
    config: AnalysisConfig,
    args: &Args,
) -> Result<()> {
    let provider = Arc::new(OllamaProvider::with_config(
        OllamaConfig::builder()
            .model(config.model.clone())
            .base_url(args.ollama_url.clone())
            .build(),
    )?);
    let orchestrator = AnalysisOrchestrator::new(config, provider);
    let report = orchestrator.analyze(&df, &request);
    println!("{report}");
    Ok(())
}

#[cfg(not(feature = "ai"))]
fn run_analysis(
    _df: DataFrame,
    _request: AnalysisRequest,
    _config: AnalysisConfig,
    _args: &Args,
) -> Result<()> {
    Err(anyhow!(
        "built without the \"ai\" feature; rerun with --no-ai to print the prompt"
    ))
}
