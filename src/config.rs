//! Run-scoped configuration: the explicit context threaded through a run,
//! and per-dataset defaults, replacing the module-level globals this system
//! used to rely on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::Span;

use crate::core::ThresholdSet;

/// Base Q/A count and coverage thresholds for one dataset tag.
#[derive(Debug, Clone, Copy)]
pub struct DatasetProfile {
    /// Base count `b` the allocator's mid and upper tiers build on.
    pub base: usize,
    /// Coverage thresholds this dataset is evaluated against.
    pub thresholds: ThresholdSet,
}

impl Default for DatasetProfile {
    fn default() -> Self {
        Self {
            base: 2,
            thresholds: ThresholdSet::default(),
        }
    }
}

/// Looks up per-dataset defaults, falling back to [`DatasetProfile::default`]
/// for any tag with no specific entry.
#[derive(Debug, Clone, Default)]
pub struct DatasetProfileTable {
    profiles: BTreeMap<String, DatasetProfile>,
}

impl DatasetProfileTable {
    /// An empty table; every lookup returns the default profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `profile` under `dataset_tag`, overriding any prior entry.
    #[must_use]
    pub fn with_profile(mut self, dataset_tag: impl Into<String>, profile: DatasetProfile) -> Self {
        self.profiles.insert(dataset_tag.into(), profile);
        self
    }

    /// The profile for `dataset_tag`, or the default profile if none was
    /// registered.
    #[must_use]
    pub fn lookup(&self, dataset_tag: &str) -> DatasetProfile {
        self.profiles.get(dataset_tag).copied().unwrap_or_default()
    }
}

/// Explicit run context: where output goes, which dataset this run is for,
/// when it started, and the tracing span everything in the run executes
/// under. Threaded through constructors instead of read from process-wide
/// state.
pub struct RunContext {
    output_dir: PathBuf,
    dataset_tag: String,
    /// `YYYYMMDD_HHMMSS`, used as the suffix on every artifact filename.
    timestamp: String,
    span: Span,
}

impl RunContext {
    /// Builds a run context for `dataset_tag`, writing artifacts under
    /// `output_dir`, stamped with `timestamp`.
    ///
    /// `timestamp` is supplied by the caller (rather than computed here)
    /// so that callers control the wall-clock source and tests can pass a
    /// fixed value.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, dataset_tag: impl Into<String>, timestamp: impl Into<String>) -> Self {
        let dataset_tag = dataset_tag.into();
        let span = tracing::info_span!("run", dataset_tag = %dataset_tag);
        Self {
            output_dir: output_dir.into(),
            dataset_tag,
            timestamp: timestamp.into(),
            span,
        }
    }

    /// Directory artifacts for this run are written under.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The dataset tag this run was invoked with.
    #[must_use]
    pub fn dataset_tag(&self) -> &str {
        &self.dataset_tag
    }

    /// The `YYYYMMDD_HHMMSS` timestamp stamped on this run's artifacts.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The tracing span every operation in this run should execute under.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_profile_table_falls_back_to_default() {
        let table = DatasetProfileTable::new();
        let profile = table.lookup("unknown");
        assert_eq!(profile.base, 2);
    }

    #[test]
    fn test_dataset_profile_table_honors_registered_profile() {
        let table = DatasetProfileTable::new().with_profile(
            "physics",
            DatasetProfile {
                base: 4,
                thresholds: ThresholdSet {
                    strict: 0.9,
                    standard: 0.8,
                    lenient: 0.7,
                },
            },
        );
        let profile = table.lookup("physics");
        assert_eq!(profile.base, 4);
        assert!((profile.thresholds.standard - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_run_context_exposes_fields() {
        let ctx = RunContext::new("/tmp/out", "demo", "20260101_000000");
        assert_eq!(ctx.dataset_tag(), "demo");
        assert_eq!(ctx.timestamp(), "20260101_000000");
        assert_eq!(ctx.output_dir(), Path::new("/tmp/out"));
    }
}
