//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. `execute` stays
//! synchronous so `main` keeps its plain `fn main() -> ExitCode` shape;
//! internally it opens a tokio runtime and blocks on the async pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::allocator::{DatasetDefaults, QACountPolicy};
use crate::chunking::merger;
use crate::chunking::semantic::SemanticChunker;
use crate::chunking::traits::{ChunkBounds, Chunker};
use crate::cli::output::{format_providers, format_run_summary, format_version, OutputFormat};
use crate::cli::parser::{Cli, Commands};
use crate::config::{DatasetProfileTable, RunContext};
use crate::core::{Chunk, Document};
use crate::coverage::CoverageAnalyzer;
use crate::dispatcher::{DispatchHandle, DispatcherConfig, InProcessBroker, TaskDispatcher};
use crate::error::{CommandError, Error, Result};
use crate::io::input::read_documents_from_file;
use crate::persist::Persistor;
use crate::provider::ProviderRegistry;

/// Default collection timeout before §6's clamp to `[10, 30]` minutes.
const DEFAULT_COLLECT_TIMEOUT: Duration = Duration::from_secs(20 * 60);
/// Grace period given to an in-flight collection after a cancel request.
const CANCEL_DRAIN_WINDOW: Duration = Duration::from_secs(5);
/// Directory the `--dataset` convention resolves input files under.
const DATASET_INPUT_DIR: &str = "./datasets";

/// Executes the parsed CLI command, returning the text to print to stdout.
///
/// # Errors
///
/// Returns an [`Error`] classified by `main` into an exit code: `Config`
/// and validation errors map to 1, pipeline/runtime errors to 2, and a
/// user cancellation to 130.
pub fn execute(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Run {
            dataset,
            input_file,
            model,
            batch_chunks,
            merge_chunks,
            min_tokens,
            max_tokens,
            max_docs,
            workers,
            coverage_threshold,
            analyze_coverage,
            output_dir,
        } => {
            let format = OutputFormat::parse(&cli.format);
            let config = RunConfig {
                dataset: dataset.clone(),
                input_file: input_file.clone(),
                model: model.clone(),
                batch_chunks: *batch_chunks,
                merge_chunks: *merge_chunks,
                min_tokens: *min_tokens,
                max_tokens: *max_tokens,
                max_docs: *max_docs,
                workers: *workers,
                coverage_threshold: *coverage_threshold,
                analyze_coverage: *analyze_coverage,
                output_dir: output_dir.clone(),
            };
            run(config, format)
        }
        Commands::Providers => {
            let format = OutputFormat::parse(&cli.format);
            let registry = ProviderRegistry::from_env()?;
            Ok(format_providers(registry.llm().tag(), registry.embedding().tag(), format))
        }
        Commands::Version => {
            let format = OutputFormat::parse(&cli.format);
            Ok(format_version(env!("CARGO_PKG_VERSION"), format))
        }
    }
}

/// Validated, owned form of the `run` subcommand's arguments.
struct RunConfig {
    dataset: Option<String>,
    input_file: Option<PathBuf>,
    model: Option<String>,
    batch_chunks: usize,
    merge_chunks: bool,
    min_tokens: usize,
    max_tokens: usize,
    max_docs: Option<usize>,
    workers: usize,
    coverage_threshold: Option<f32>,
    analyze_coverage: bool,
    output_dir: PathBuf,
}

fn run(config: RunConfig, format: OutputFormat) -> Result<String> {
    validate(&config)?;

    let registry = ProviderRegistry::from_env()?;
    let dataset_tag = dataset_tag(&config)?;
    let input_path = resolve_input_path(&config)?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        Error::Command(CommandError::ExecutionFailed(format!("failed to create async runtime: {e}")))
    })?;

    rt.block_on(run_pipeline(config, format, registry, dataset_tag, input_path))
}

fn validate(config: &RunConfig) -> Result<()> {
    if !(1..=5).contains(&config.batch_chunks) {
        return Err(Error::Command(CommandError::InvalidArgument(format!(
            "--batch-chunks must be in 1..=5, got {}",
            config.batch_chunks
        ))));
    }
    if config.min_tokens >= config.max_tokens {
        return Err(Error::Chunking(crate::error::ChunkingError::BoundsInverted {
            min: config.min_tokens,
            max: config.max_tokens,
        }));
    }
    if config.workers == 0 {
        return Err(Error::Dispatch(crate::error::DispatchError::TooFewWorkers {
            requested: 0,
            available: 1,
        }));
    }
    Ok(())
}

fn dataset_tag(config: &RunConfig) -> Result<String> {
    if let Some(tag) = &config.dataset {
        return Ok(tag.clone());
    }
    let path = config.input_file.as_ref().ok_or(Error::Command(CommandError::ExclusiveArgsViolated))?;
    Ok(path.file_stem().and_then(|s| s.to_str()).unwrap_or("input").to_string())
}

/// Resolves the input file to read from: the explicit `--input-file`, or
/// the conventional `./datasets/<tag>.{jsonl,json,csv,txt}` location for
/// `--dataset`. Actually fetching a named dataset from a remote catalog is
/// out of scope; this is the minimal local-filesystem acquisition path.
fn resolve_input_path(config: &RunConfig) -> Result<PathBuf> {
    if let Some(path) = &config.input_file {
        return Ok(path.clone());
    }
    let tag = config.dataset.as_deref().ok_or(Error::Command(CommandError::ExclusiveArgsViolated))?;
    for ext in ["jsonl", "json", "csv", "txt"] {
        let candidate = Path::new(DATASET_INPUT_DIR).join(format!("{tag}.{ext}"));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(Error::Config {
        message: format!(
            "no input file found for dataset '{tag}' under {DATASET_INPUT_DIR} \
             (tried .jsonl, .json, .csv, .txt); pass --input-file explicitly instead"
        ),
    })
}

async fn run_pipeline(
    config: RunConfig,
    format: OutputFormat,
    registry: ProviderRegistry,
    dataset_tag: String,
    input_path: PathBuf,
) -> Result<String> {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let ctx = RunContext::new(config.output_dir.clone(), dataset_tag.clone(), timestamp.clone());
    let _span = ctx.span().enter();

    tracing::info!(dataset_tag = %dataset_tag, input = %input_path.display(), "starting run");

    let mut documents = read_documents_from_file(&input_path)?;
    if let Some(max_docs) = config.max_docs {
        documents.truncate(max_docs);
    }
    if documents.is_empty() {
        return Err(Error::InvalidState {
            message: "input source yielded zero documents".to_string(),
        });
    }

    let chunks = chunk_documents(&documents, config.min_tokens, config.max_tokens, config.merge_chunks)?;

    let profile_table = DatasetProfileTable::new();
    let profile = profile_table.lookup(&dataset_tag);

    let policy = QACountPolicy::new();
    let requested_counts: Vec<usize> = chunks
        .iter()
        .map(|c| policy.choose(c, DatasetDefaults { base: profile.base }))
        .collect();

    let broker = Arc::new(InProcessBroker::new());
    let dispatcher = TaskDispatcher::new(
        broker,
        registry.llm(),
        DispatcherConfig {
            worker_count: config.workers,
            batch_size: config.batch_chunks,
            model_hint: config.model.clone(),
            jitter_enabled: true,
        },
    );

    let handle: DispatchHandle = dispatcher.submit(&chunks, &requested_counts, &dataset_tag).await?;
    let outcome = collect_with_cancellation(&dispatcher, handle).await?;

    let total = outcome.diagnostics.success + outcome.diagnostics.failure + outcome.diagnostics.error;
    if total > 0 {
        #[allow(clippy::cast_precision_loss)]
        let success_rate = outcome.diagnostics.success as f64 / total as f64;
        if success_rate < 0.9 {
            tracing::warn!(success_rate, "run success rate below 90%");
        }
    }

    let coverage = if config.analyze_coverage {
        let analyzer = CoverageAnalyzer::new(&*registry.embedding());
        Some(
            analyzer
                .analyze(&chunks, &outcome.pairs, &dataset_tag, profile.thresholds, config.coverage_threshold)
                .await?,
        )
    } else {
        None
    };

    let persistor = Persistor::new(ctx.output_dir(), None);
    let summary = persistor.write_artifacts(
        ctx.timestamp(),
        &outcome.pairs,
        coverage.as_ref(),
        outcome.diagnostics.success,
        outcome.diagnostics.failure,
        outcome.diagnostics.error,
    )?;

    Ok(format_run_summary(&summary, format))
}

async fn collect_with_cancellation(
    dispatcher: &TaskDispatcher,
    handle: DispatchHandle,
) -> Result<crate::dispatcher::CollectOutcome> {
    let timeout = crate::dispatcher::clamp_timeout(DEFAULT_COLLECT_TIMEOUT);
    let collect_fut = dispatcher.collect(handle, timeout);
    tokio::pin!(collect_fut);

    tokio::select! {
        outcome = &mut collect_fut => Ok(outcome),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("cancellation requested, draining in-flight tasks briefly");
            match tokio::time::timeout(CANCEL_DRAIN_WINDOW, &mut collect_fut).await {
                Ok(outcome) => Ok(outcome),
                Err(_) => Err(Error::Command(CommandError::Cancelled)),
            }
        }
    }
}

fn chunk_documents(
    documents: &[Document],
    min_tokens: usize,
    max_tokens: usize,
    merge_chunks: bool,
) -> Result<Vec<Chunk>> {
    let chunker = SemanticChunker::new();
    let bounds = ChunkBounds::new(min_tokens, max_tokens);

    let mut chunks = Vec::new();
    for (doc_index, document) in documents.iter().enumerate() {
        chunks.extend(chunker.split(document, doc_index, bounds)?);
    }

    if merge_chunks {
        chunks = merger::merge(chunks, min_tokens, max_tokens);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> RunConfig {
        RunConfig {
            dataset: Some("demo".to_string()),
            input_file: None,
            model: None,
            batch_chunks: 1,
            merge_chunks: false,
            min_tokens: 100,
            max_tokens: 400,
            max_docs: None,
            workers: 4,
            coverage_threshold: None,
            analyze_coverage: false,
            output_dir: PathBuf::from("./output"),
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range_batch_chunks() {
        let mut config = base_config();
        config.batch_chunks = 6;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = base_config();
        config.min_tokens = 500;
        config.max_tokens = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = base_config();
        config.workers = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_dataset_tag_uses_dataset_flag() {
        let config = base_config();
        assert_eq!(dataset_tag(&config).unwrap(), "demo");
    }

    #[test]
    fn test_dataset_tag_derived_from_input_file_stem() {
        let mut config = base_config();
        config.dataset = None;
        config.input_file = Some(PathBuf::from("/tmp/physics.jsonl"));
        assert_eq!(dataset_tag(&config).unwrap(), "physics");
    }

    #[test]
    fn test_resolve_input_path_prefers_explicit_file() {
        let mut config = base_config();
        config.dataset = None;
        config.input_file = Some(PathBuf::from("/tmp/physics.jsonl"));
        assert_eq!(resolve_input_path(&config).unwrap(), PathBuf::from("/tmp/physics.jsonl"));
    }

    #[test]
    fn test_resolve_input_path_errors_when_dataset_not_found() {
        let mut config = base_config();
        config.dataset = Some("no-such-dataset-xyz".to_string());
        assert!(matches!(resolve_input_path(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn test_chunk_documents_splits_and_merges() {
        let docs = vec![Document::new("d1", "word ".repeat(10), crate::core::Language::En)];
        let chunks = chunk_documents(&docs, 5, 400, true).unwrap();
        assert!(!chunks.is_empty());
    }
}
