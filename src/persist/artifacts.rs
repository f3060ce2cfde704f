//! Writes the Q/A JSON, Q/A CSV, compact CSV, coverage report, and summary
//! artifacts for a run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{CoverageReport, QAPair};
use crate::error::{IoError, PersistError, Result};

/// Paths of every artifact written for one run.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactPaths {
    /// Full Q/A JSON array.
    pub qa_json: PathBuf,
    /// Full-schema Q/A CSV.
    pub qa_csv: PathBuf,
    /// `question,answer`-only CSV for re-ingestion.
    pub compact_csv: PathBuf,
    /// Coverage report JSON, if coverage analysis ran.
    pub coverage_json: Option<PathBuf>,
    /// Summary JSON (counts and the paths above).
    pub summary_json: PathBuf,
}

/// Run counts written into the summary artifact.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Total Q/A pairs persisted.
    pub pair_count: usize,
    /// Tasks that reached `success`.
    pub success_count: usize,
    /// Tasks that reached `failure`.
    pub failure_count: usize,
    /// Tasks that never reached a terminal state.
    pub error_count: usize,
    /// Paths of the artifacts written alongside this summary.
    pub artifacts: ArtifactPaths,
}

/// Writes the Q/A JSON array to `dir/qa_{timestamp}.json`.
///
/// # Errors
///
/// Returns [`PersistError::ArtifactWriteFailed`] on any I/O or encode error.
pub fn write_qa_json(dir: &Path, timestamp: &str, pairs: &[QAPair]) -> Result<PathBuf> {
    let path = dir.join(format!("qa_{timestamp}.json"));
    let json = serde_json::to_string_pretty(pairs).map_err(|e| artifact_error(&path, &e))?;
    std::fs::write(&path, json).map_err(|e| artifact_error(&path, &e))?;
    Ok(path)
}

/// Writes the full-schema Q/A CSV to `dir/qa_{timestamp}.csv`.
///
/// # Errors
///
/// Returns [`PersistError::ArtifactWriteFailed`] on any I/O or encode error.
pub fn write_qa_csv(dir: &Path, timestamp: &str, pairs: &[QAPair]) -> Result<PathBuf> {
    let path = dir.join(format!("qa_{timestamp}.csv"));
    let mut writer = csv::Writer::from_path(&path).map_err(|e| artifact_error(&path, &e))?;
    for pair in pairs {
        writer.serialize(pair).map_err(|e| artifact_error(&path, &e))?;
    }
    writer.flush().map_err(|e| artifact_error(&path, &e))?;
    Ok(path)
}

/// Writes a compact `question,answer` CSV to `dir/qa_compact_{timestamp}.csv`,
/// intended for easy re-ingestion.
///
/// # Errors
///
/// Returns [`PersistError::ArtifactWriteFailed`] on any I/O or encode error.
pub fn write_compact_csv(dir: &Path, timestamp: &str, pairs: &[QAPair]) -> Result<PathBuf> {
    #[derive(Serialize)]
    struct CompactRow<'a> {
        question: &'a str,
        answer: &'a str,
    }

    let path = dir.join(format!("qa_compact_{timestamp}.csv"));
    let mut writer = csv::Writer::from_path(&path).map_err(|e| artifact_error(&path, &e))?;
    for pair in pairs {
        writer
            .serialize(CompactRow {
                question: &pair.question,
                answer: &pair.answer,
            })
            .map_err(|e| artifact_error(&path, &e))?;
    }
    writer.flush().map_err(|e| artifact_error(&path, &e))?;
    Ok(path)
}

/// Writes the coverage report JSON to `dir/coverage_{timestamp}.json`.
///
/// # Errors
///
/// Returns [`PersistError::ArtifactWriteFailed`] on any I/O or encode error.
pub fn write_coverage_json(dir: &Path, timestamp: &str, report: &CoverageReport) -> Result<PathBuf> {
    let path = dir.join(format!("coverage_{timestamp}.json"));
    let json = serde_json::to_string_pretty(report).map_err(|e| artifact_error(&path, &e))?;
    std::fs::write(&path, json).map_err(|e| artifact_error(&path, &e))?;
    Ok(path)
}

/// Writes the run summary JSON to `dir/summary_{timestamp}.json`.
///
/// # Errors
///
/// Returns [`PersistError::ArtifactWriteFailed`] on any I/O or encode error.
pub fn write_summary_json(dir: &Path, timestamp: &str, summary: &RunSummary) -> Result<PathBuf> {
    let path = dir.join(format!("summary_{timestamp}.json"));
    let json = serde_json::to_string_pretty(summary).map_err(|e| artifact_error(&path, &e))?;
    std::fs::write(&path, json).map_err(|e| artifact_error(&path, &e))?;
    Ok(path)
}

/// Writes every Q/A artifact (JSON, full CSV, compact CSV), the coverage
/// report when present, and the summary, returning their paths.
///
/// # Errors
///
/// Returns [`PersistError::ArtifactWriteFailed`] if any artifact fails to
/// write, or an I/O error if `dir` cannot be created.
pub fn write_run_outputs(
    dir: &Path,
    timestamp: &str,
    pairs: &[QAPair],
    coverage: Option<&CoverageReport>,
    success_count: usize,
    failure_count: usize,
    error_count: usize,
) -> Result<RunSummary> {
    std::fs::create_dir_all(dir).map_err(|e| {
        IoError::DirectoryFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    let qa_json = write_qa_json(dir, timestamp, pairs)?;
    let qa_csv = write_qa_csv(dir, timestamp, pairs)?;
    let compact_csv = write_compact_csv(dir, timestamp, pairs)?;
    let coverage_json = coverage
        .map(|report| write_coverage_json(dir, timestamp, report))
        .transpose()?;

    let artifacts = ArtifactPaths {
        qa_json,
        qa_csv,
        compact_csv,
        coverage_json,
        summary_json: dir.join(format!("summary_{timestamp}.json")),
    };

    let summary = RunSummary {
        pair_count: pairs.len(),
        success_count,
        failure_count,
        error_count,
        artifacts,
    };

    write_summary_json(dir, timestamp, &summary)?;
    Ok(summary)
}

fn artifact_error(path: &Path, reason: &impl ToString) -> crate::error::Error {
    PersistError::ArtifactWriteFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
    .into()
}
