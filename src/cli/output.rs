//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use std::fmt::Write;

use crate::error::{
    ChunkingError, CommandError, CoverageError, DispatchError, IoError, PersistError, ProviderError,
};
use crate::persist::RunSummary;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a run summary.
#[must_use]
pub fn format_run_summary(summary: &RunSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_run_summary_text(summary),
        OutputFormat::Json => format_json(summary),
    }
}

fn format_run_summary_text(summary: &RunSummary) -> String {
    let total = summary.success_count + summary.failure_count + summary.error_count;
    let rate = if total == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let rate = summary.success_count as f64 / total as f64 * 100.0;
        rate
    };

    let mut output = String::new();
    output.push_str("qa-forge run summary\n");
    output.push_str("=====================\n\n");
    let _ = writeln!(output, "  Pairs written: {}", summary.pair_count);
    let _ = writeln!(output, "  Success:       {}", summary.success_count);
    let _ = writeln!(output, "  Failure:       {}", summary.failure_count);
    let _ = writeln!(output, "  Error:         {}", summary.error_count);
    let _ = writeln!(output, "  Success rate:  {rate:.1}%");
    if rate < 90.0 && total > 0 {
        output.push_str("  warning: success rate below 90%; see artifacts for failed chunks\n");
    }
    output.push('\n');
    let _ = writeln!(output, "  Q/A JSON:      {}", summary.artifacts.qa_json.display());
    let _ = writeln!(output, "  Q/A CSV:       {}", summary.artifacts.qa_csv.display());
    let _ = writeln!(output, "  Compact CSV:   {}", summary.artifacts.compact_csv.display());
    if let Some(ref path) = summary.artifacts.coverage_json {
        let _ = writeln!(output, "  Coverage JSON: {}", path.display());
    }
    let _ = writeln!(output, "  Summary JSON:  {}", summary.artifacts.summary_json.display());
    output
}

/// Formats the configured provider tags.
#[must_use]
pub fn format_providers(llm_tag: &str, embedding_tag: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "LLM provider:       {llm_tag}");
            let _ = writeln!(output, "Embedding provider: {embedding_tag}");
            output
        }
        OutputFormat::Json => format_json(&serde_json::json!({
            "llm_provider": llm_tag,
            "embedding_provider": embedding_tag,
        })),
    }
}

/// Formats the version string.
#[must_use]
pub fn format_version(version: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("qa-forge {version}\n"),
        OutputFormat::Json => format_json(&serde_json::json!({ "version": version })),
    }
}

/// Formats a value as JSON.
fn format_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an error for output.
///
/// When format is JSON, returns a structured error object. When format is
/// Text, returns the error message string.
#[must_use]
pub fn format_error(error: &crate::Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            let (error_type, suggestion) = get_error_details(error);
            let json = serde_json::json!({
                "success": false,
                "error": {
                    "type": error_type,
                    "message": error.to_string(),
                    "suggestion": suggestion
                }
            });
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

/// Extracts error type and recovery suggestion from an error.
const fn get_error_details(error: &crate::Error) -> (&'static str, Option<&'static str>) {
    match error {
        crate::Error::Chunking(e) => match e {
            ChunkingError::InvalidUtf8 { .. } => ("InvalidUtf8", None),
            ChunkingError::ChunkTooLarge { .. } => {
                ("ChunkTooLarge", Some("Use a larger --max-tokens value"))
            }
            ChunkingError::InvalidConfig { .. } => ("InvalidConfig", None),
            ChunkingError::BoundsInverted { .. } => (
                "BoundsInverted",
                Some("--min-tokens must be less than --max-tokens"),
            ),
        },
        crate::Error::Provider(e) => match e {
            ProviderError::Timeout { .. } => ("ProviderTimeout", Some("Retry the run; the provider is slow or unreachable")),
            ProviderError::Transient(_) => ("ProviderTransient", Some("Retry the run")),
            ProviderError::SchemaMismatch(_) => ("ProviderSchemaMismatch", None),
            ProviderError::EmptyOutput => ("ProviderEmptyOutput", None),
            ProviderError::Unknown(_) => (
                "UnknownProvider",
                Some("Set LLM_PROVIDER/EMBEDDING_PROVIDER to openai or gemini"),
            ),
            ProviderError::MissingConfig(_) => (
                "MissingProviderConfig",
                Some("Set the provider's API key environment variable"),
            ),
        },
        crate::Error::Dispatch(e) => match e {
            DispatchError::BrokerUnreachable(_) => (
                "BrokerUnreachable",
                Some("Check the broker backend and retry"),
            ),
            DispatchError::TooFewWorkers { .. } => (
                "TooFewWorkers",
                Some("Lower --workers or provision more worker capacity"),
            ),
            DispatchError::ResultReadFailed { .. } => ("ResultReadFailed", None),
        },
        crate::Error::Coverage(e) => match e {
            CoverageError::DimensionMismatch { .. } => ("CoverageDimensionMismatch", None),
        },
        crate::Error::Persist(e) => match e {
            PersistError::ArtifactWriteFailed { .. } => (
                "ArtifactWriteFailed",
                Some("Check that --output-dir is writable"),
            ),
            PersistError::VectorStoreWriteFailed(_) => (
                "VectorStoreWriteFailed",
                Some("Artifacts were still written; check the vector store and retry ingestion"),
            ),
            PersistError::Csv(_) => ("CsvError", None),
        },
        crate::Error::Io(e) => match e {
            IoError::FileNotFound { .. } => ("FileNotFound", Some("Verify the file path exists")),
            IoError::ReadFailed { .. } => ("ReadError", None),
            IoError::WriteFailed { .. } => ("WriteError", None),
            IoError::MmapFailed { .. } => ("MemoryMapError", None),
            IoError::DirectoryFailed { .. } => ("DirectoryError", None),
            IoError::UnrecognizedFormat { .. } => (
                "UnrecognizedFormat",
                Some("Use a .csv, .txt, .json, or .jsonl input file"),
            ),
            IoError::Generic(_) => ("IoError", None),
        },
        crate::Error::Command(e) => match e {
            CommandError::InvalidArgument(_) => ("InvalidArgument", None),
            CommandError::ExclusiveArgsViolated => (
                "ExclusiveArgsViolated",
                Some("Pass exactly one of --dataset or --input-file"),
            ),
            CommandError::ExecutionFailed(_) => ("ExecutionFailed", None),
            CommandError::Cancelled => ("Cancelled", None),
        },
        crate::Error::InvalidState { .. } => ("InvalidState", None),
        crate::Error::Config { .. } => ("ConfigError", None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_format_providers_text() {
        let text = format_providers("openai", "gemini", OutputFormat::Text);
        assert!(text.contains("LLM provider:       openai"));
        assert!(text.contains("Embedding provider: gemini"));
    }

    #[test]
    fn test_format_providers_json() {
        let json = format_providers("openai", "gemini", OutputFormat::Json);
        assert!(json.contains("\"llm_provider\": \"openai\""));
    }

    #[test]
    fn test_format_version() {
        let text = format_version("0.1.0", OutputFormat::Text);
        assert!(text.contains("qa-forge 0.1.0"));
    }

    #[test]
    fn test_format_error_text_and_json() {
        let error = crate::Error::Command(CommandError::ExclusiveArgsViolated);
        let text = format_error(&error, OutputFormat::Text);
        assert!(text.contains("exactly one"));

        let json = format_error(&error, OutputFormat::Json);
        assert!(json.contains("\"ExclusiveArgsViolated\""));
    }
}
