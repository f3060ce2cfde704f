//! Coverage report data model, produced once per run after all Q/A pairs
//! have been collected (see [`crate::coverage`] for the analyzer).

use serde::{Deserialize, Serialize};

/// The three named thresholds a dataset profile chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// The most demanding threshold.
    pub strict: f32,
    /// The primary threshold used unless an override is supplied.
    pub standard: f32,
    /// The most permissive threshold.
    pub lenient: f32,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            strict: 0.85,
            standard: 0.75,
            lenient: 0.65,
        }
    }
}

/// Coverage counted under a single threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdReport {
    /// Number of chunks whose max similarity meets this threshold.
    pub covered: usize,
    /// `covered / total_chunks`, or 0.0 when there are no chunks.
    pub rate: f32,
    /// Chunk ids that did not meet this threshold, with their gap.
    pub uncovered: Vec<UncoveredChunk>,
}

/// A chunk that fell short of a threshold, and by how much.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncoveredChunk {
    /// The chunk's id.
    pub chunk_id: String,
    /// `threshold - max_similarity`, always positive.
    pub gap: f32,
}

/// Coverage rate for one bucket (a length or position partition of chunks).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    /// Chunks in the bucket.
    pub total: usize,
    /// Chunks in the bucket meeting the primary threshold.
    pub covered: usize,
    /// `covered / total`, or 0.0 when the bucket is empty.
    pub rate: f32,
}

impl BucketStats {
    /// Builds bucket stats and its rate from raw counts.
    #[must_use]
    pub fn new(total: usize, covered: usize) -> Self {
        let rate = if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = covered as f32 / total as f32;
            rate
        };
        Self {
            total,
            covered,
            rate,
        }
    }
}

/// Full coverage report for a run, produced by [`crate::coverage::CoverageAnalyzer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Dataset tag the run was invoked with.
    #[serde(rename = "dataset_type")]
    pub dataset_tag: String,
    /// Total number of chunks considered.
    pub total_chunks: usize,
    /// Coverage rate under the primary (standard, or override) threshold.
    pub coverage_rate: f32,
    /// Number of chunks covered under the primary threshold.
    pub covered_chunks: usize,
    /// Chunks that fell short of the primary threshold (same set as
    /// `multi_threshold`'s report for that threshold, surfaced at the top
    /// level since it's the one callers want without digging through
    /// `multi_threshold`).
    pub uncovered_chunks: Vec<UncoveredChunk>,
    /// The primary threshold actually used for `coverage_rate`/`covered_chunks`.
    pub threshold: f32,
    /// Max similarity achieved by each chunk, in chunk order.
    pub max_similarities: Vec<f32>,
    /// Per-threshold breakdown for strict/standard/lenient.
    pub multi_threshold: MultiThreshold,
    /// Per-length-bucket and per-position-bucket coverage.
    pub chunk_analysis: ChunkAnalysis,
    /// The dataset's configured strict/standard/lenient thresholds, as
    /// applied for this run (distinct from the per-chunk `threshold` field,
    /// which is just the primary one).
    pub optimal_thresholds: ThresholdSet,
}

/// The three threshold reports named in the spec's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiThreshold {
    /// Report under the strict threshold.
    pub strict: ThresholdReport,
    /// Report under the standard threshold.
    pub standard: ThresholdReport,
    /// Report under the lenient threshold.
    pub lenient: ThresholdReport,
}

/// Bucketed coverage, by chunk length and by chunk position within its
/// document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkAnalysis {
    /// Coverage by length bucket: `short`, `medium`, `long`.
    pub by_length: std::collections::BTreeMap<String, BucketStats>,
    /// Coverage by position bucket: `beginning`, `middle`, `end`.
    pub by_position: std::collections::BTreeMap<String, BucketStats>,
    /// Free-text natural-language insights for buckets under the insight
    /// floor (see `crate::coverage`).
    pub summary: Vec<String>,
}

impl CoverageReport {
    /// The empty-document boundary case: zero chunks, zero-defined coverage.
    #[must_use]
    pub fn empty(dataset_tag: impl Into<String>, threshold: f32) -> Self {
        Self::empty_with_thresholds(dataset_tag, threshold, ThresholdSet::default())
    }

    /// As [`CoverageReport::empty`], but records the dataset's full
    /// threshold set rather than assuming the default one.
    #[must_use]
    pub fn empty_with_thresholds(dataset_tag: impl Into<String>, threshold: f32, thresholds: ThresholdSet) -> Self {
        let empty_threshold = ThresholdReport {
            covered: 0,
            rate: 0.0,
            uncovered: Vec::new(),
        };
        Self {
            dataset_tag: dataset_tag.into(),
            total_chunks: 0,
            coverage_rate: 0.0,
            covered_chunks: 0,
            uncovered_chunks: Vec::new(),
            threshold,
            max_similarities: Vec::new(),
            multi_threshold: MultiThreshold {
                strict: empty_threshold.clone(),
                standard: empty_threshold.clone(),
                lenient: empty_threshold,
            },
            chunk_analysis: ChunkAnalysis {
                by_length: std::collections::BTreeMap::new(),
                by_position: std::collections::BTreeMap::new(),
                summary: Vec::new(),
            },
            optimal_thresholds: thresholds,
        }
    }
}
