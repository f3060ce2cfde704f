//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

/// qa-forge: synthesizes Q/A pairs from a document corpus through an LLM
/// provider pool, then scores how well the pairs cover the source chunks.
#[derive(Parser, Debug)]
#[command(name = "qa-forge")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the full synthesis pipeline: read, chunk, merge, dispatch,
    /// collect, optionally analyze coverage, persist.
    #[command(group(
        ArgGroup::new("source")
            .required(true)
            .args(["dataset", "input_file"]),
    ))]
    Run {
        /// Dataset tag, resolved against the configured dataset profile
        /// table and the conventional `./datasets/<tag>.*` input location.
        #[arg(long)]
        dataset: Option<String>,

        /// Path to an input file (csv, txt, json, jsonl), used in place of
        /// a dataset tag.
        #[arg(long)]
        input_file: Option<PathBuf>,

        /// Model hint forwarded to the LLM provider.
        #[arg(long)]
        model: Option<String>,

        /// Chunks a single worker claims and prompts together (1..=5).
        #[arg(long, default_value_t = 1)]
        batch_chunks: usize,

        /// Merges undersized adjacent chunks before dispatch.
        #[arg(long)]
        merge_chunks: bool,

        /// Minimum tokens a chunk should meet after merging.
        #[arg(long, default_value_t = 100)]
        min_tokens: usize,

        /// Maximum tokens a chunk may carry before a forced split.
        #[arg(long, default_value_t = 400)]
        max_tokens: usize,

        /// Caps the number of documents read from the input source.
        #[arg(long)]
        max_docs: Option<usize>,

        /// Number of concurrent workers draining the task queue.
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Overrides the dataset's standard coverage threshold.
        #[arg(long)]
        coverage_threshold: Option<f32>,

        /// Runs the coverage analyzer once collection completes.
        #[arg(long)]
        analyze_coverage: bool,

        /// Directory run artifacts are written under.
        #[arg(long, default_value = "./output")]
        output_dir: PathBuf,
    },

    /// Lists the LLM and embedding provider tags configured via environment.
    Providers,

    /// Prints the crate version.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_requires_dataset_or_input_file() {
        let result = Cli::try_parse_from(["qa-forge", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_rejects_both_dataset_and_input_file() {
        let result = Cli::try_parse_from([
            "qa-forge",
            "run",
            "--dataset",
            "physics",
            "--input-file",
            "docs.jsonl",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_accepts_dataset_alone() {
        let cli = Cli::try_parse_from(["qa-forge", "run", "--dataset", "physics"]).unwrap();
        match cli.command {
            Commands::Run { dataset, input_file, .. } => {
                assert_eq!(dataset.as_deref(), Some("physics"));
                assert!(input_file.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["qa-forge", "run", "--dataset", "physics"]).unwrap();
        match cli.command {
            Commands::Run {
                batch_chunks,
                min_tokens,
                max_tokens,
                workers,
                merge_chunks,
                analyze_coverage,
                ..
            } => {
                assert_eq!(batch_chunks, 1);
                assert_eq!(min_tokens, 100);
                assert_eq!(max_tokens, 400);
                assert_eq!(workers, 4);
                assert!(!merge_chunks);
                assert!(!analyze_coverage);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
