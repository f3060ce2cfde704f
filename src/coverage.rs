//! Coverage analysis: how well the generated Q/A pairs cover the merged
//! chunk set, under multiple thresholds and bucketed by length and
//! position.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::core::{
    BucketStats, Chunk, ChunkAnalysis, CoverageReport, MultiThreshold, QAPair, ThresholdReport,
    ThresholdSet, UncoveredChunk,
};
use crate::error::Result;
use crate::provider::embedding::{cosine_similarity, EmbeddingProvider};

/// Coverage rate below which a bucket earns a natural-language insight.
const INSIGHT_FLOOR: f32 = 0.7;

/// Computes coverage of a merged chunk set by a generated Q/A set.
pub struct CoverageAnalyzer<'a> {
    embedding: &'a dyn EmbeddingProvider,
}

impl<'a> CoverageAnalyzer<'a> {
    /// Builds an analyzer over the given embedding provider.
    #[must_use]
    pub const fn new(embedding: &'a dyn EmbeddingProvider) -> Self {
        Self { embedding }
    }

    /// Runs the full analysis and produces a [`CoverageReport`].
    ///
    /// `override_threshold`, when present, is used as the primary threshold
    /// in place of `thresholds.standard`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::Error::Provider`] if embedding either set
    /// of texts fails.
    pub async fn analyze(
        &self,
        chunks: &[Chunk],
        pairs: &[QAPair],
        dataset_tag: &str,
        thresholds: ThresholdSet,
        override_threshold: Option<f32>,
    ) -> Result<CoverageReport> {
        let primary = override_threshold.unwrap_or(thresholds.standard);

        if chunks.is_empty() {
            return Ok(CoverageReport::empty_with_thresholds(dataset_tag, primary, thresholds));
        }

        let chunk_texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let qa_texts: Vec<String> = pairs
            .iter()
            .map(|p| format!("{} {}", p.question, p.answer))
            .collect();

        let chunk_embeddings = self.embedding.embed_batch(&chunk_texts).await?;
        let qa_embeddings = if qa_texts.is_empty() {
            Vec::new()
        } else {
            self.embedding.embed_batch(&qa_texts).await?
        };

        let max_similarities = max_similarity_per_chunk(&chunk_embeddings, &qa_embeddings);

        let strict = threshold_report(chunks, &max_similarities, thresholds.strict);
        let standard = threshold_report(chunks, &max_similarities, thresholds.standard);
        let lenient = threshold_report(chunks, &max_similarities, thresholds.lenient);
        let primary_report = threshold_report(chunks, &max_similarities, primary);

        let doc_sizes = document_chunk_counts(chunks);
        let by_length = bucket_by(chunks, &max_similarities, primary, |c| c.length_bucket().to_string());
        let by_position = bucket_by(chunks, &max_similarities, primary, |c| {
            position_bucket(c, &doc_sizes).to_string()
        });

        let mut insights = Vec::new();
        collect_insights(&by_length, "chunks", &mut insights);
        collect_insights(&by_position, "chunks", &mut insights);

        Ok(CoverageReport {
            dataset_tag: dataset_tag.to_string(),
            total_chunks: chunks.len(),
            coverage_rate: primary_report.rate,
            covered_chunks: primary_report.covered,
            uncovered_chunks: primary_report.uncovered,
            threshold: primary,
            max_similarities,
            multi_threshold: MultiThreshold { strict, standard, lenient },
            chunk_analysis: ChunkAnalysis { by_length, by_position, summary: insights },
            optimal_thresholds: thresholds,
        })
    }
}

/// For each chunk, the highest cosine similarity to any Q/A embedding. A
/// chunk with no Q/A pairs to compare against gets `0.0`.
fn max_similarity_per_chunk(chunk_embeddings: &[Vec<f32>], qa_embeddings: &[Vec<f32>]) -> Vec<f32> {
    chunk_embeddings
        .par_iter()
        .map(|chunk_vec| {
            qa_embeddings
                .iter()
                .map(|qa_vec| cosine_similarity(chunk_vec, qa_vec))
                .fold(f32::MIN, f32::max)
        })
        .map(|m| if m == f32::MIN { 0.0 } else { m })
        .collect()
}

fn threshold_report(chunks: &[Chunk], max_similarities: &[f32], threshold: f32) -> ThresholdReport {
    let mut covered = 0;
    let mut uncovered = Vec::new();

    for (chunk, &m) in chunks.iter().zip(max_similarities) {
        if m >= threshold {
            covered += 1;
        } else {
            uncovered.push(UncoveredChunk {
                chunk_id: chunk.chunk_id.clone(),
                gap: threshold - m,
            });
        }
    }

    ThresholdReport {
        covered,
        rate: rate(covered, chunks.len()),
        uncovered,
    }
}

fn rate(covered: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let rate = covered as f32 / total as f32;
        rate
    }
}

fn document_chunk_counts(chunks: &[Chunk]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for chunk in chunks {
        *counts.entry(chunk.doc_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Beginning (<33%), middle (<67%), or end, of a chunk's position within
/// its document's chunk count.
fn position_bucket(chunk: &Chunk, doc_sizes: &BTreeMap<String, usize>) -> &'static str {
    let total = doc_sizes.get(&chunk.doc_id).copied().unwrap_or(1).max(1);
    #[allow(clippy::cast_precision_loss)]
    let fraction = chunk.chunk_index as f32 / total as f32;
    if fraction < 0.33 {
        "beginning"
    } else if fraction < 0.67 {
        "middle"
    } else {
        "end"
    }
}

fn bucket_by(
    chunks: &[Chunk],
    max_similarities: &[f32],
    threshold: f32,
    bucket_of: impl Fn(&Chunk) -> String,
) -> BTreeMap<String, BucketStats> {
    let mut totals: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for (chunk, &m) in chunks.iter().zip(max_similarities) {
        let entry = totals.entry(bucket_of(chunk)).or_insert((0, 0));
        entry.0 += 1;
        if m >= threshold {
            entry.1 += 1;
        }
    }

    totals
        .into_iter()
        .map(|(bucket, (total, covered))| (bucket, BucketStats::new(total, covered)))
        .collect()
}

fn collect_insights(buckets: &BTreeMap<String, BucketStats>, noun: &str, insights: &mut Vec<String>) {
    for (name, stats) in buckets {
        if stats.total > 0 && stats.rate < INSIGHT_FLOOR {
            insights.push(format!(
                "{name} {noun} are under-covered: {:.0}% ({}/{})",
                stats.rate * 100.0,
                stats.covered,
                stats.total
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OriginKind, QuestionType};
    use async_trait::async_trait;

    struct FixedEmbedding {
        chunk_vecs: Vec<Vec<f32>>,
        qa_vecs: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedding {
        fn tag(&self) -> &'static str {
            "fixed"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.len() == self.chunk_vecs.len() {
                Ok(self.chunk_vecs.clone())
            } else {
                Ok(self.qa_vecs.clone())
            }
        }
    }

    fn chunk(doc_id: &str, chunk_index: usize, tokens: usize) -> Chunk {
        Chunk::new(doc_id, 0, chunk_index, "text", tokens, OriginKind::Paragraph, vec![])
    }

    fn pair(source_chunk_id: &str, chunk_index: usize) -> QAPair {
        QAPair {
            question: "Q?".to_string(),
            answer: "A.".to_string(),
            question_type: QuestionType::Fact,
            source_chunk_id: source_chunk_id.to_string(),
            doc_id: "doc-1".to_string(),
            dataset_tag: "demo".to_string(),
            chunk_index,
            provider_tag: None,
        }
    }

    #[tokio::test]
    async fn test_empty_chunks_yields_empty_report() {
        let embedding = FixedEmbedding { chunk_vecs: vec![], qa_vecs: vec![] };
        let analyzer = CoverageAnalyzer::new(&embedding);
        let report = analyzer
            .analyze(&[], &[], "demo", ThresholdSet::default(), None)
            .await
            .unwrap();
        assert_eq!(report.total_chunks, 0);
        assert!((report.coverage_rate - 0.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_identical_vectors_are_fully_covered() {
        let chunks = vec![chunk("doc-1", 0, 50), chunk("doc-1", 1, 50)];
        let pairs = vec![pair("doc-1#0", 0), pair("doc-1#1", 1)];
        let embedding = FixedEmbedding {
            chunk_vecs: vec![vec![1.0, 0.0], vec![1.0, 0.0]],
            qa_vecs: vec![vec![1.0, 0.0], vec![1.0, 0.0]],
        };
        let analyzer = CoverageAnalyzer::new(&embedding);
        let report = analyzer
            .analyze(&chunks, &pairs, "demo", ThresholdSet::default(), None)
            .await
            .unwrap();
        assert_eq!(report.covered_chunks, 2);
        assert!((report.coverage_rate - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_orthogonal_vectors_are_uncovered() {
        let chunks = vec![chunk("doc-1", 0, 50)];
        let pairs = vec![pair("doc-1#0", 0)];
        let embedding = FixedEmbedding {
            chunk_vecs: vec![vec![1.0, 0.0]],
            qa_vecs: vec![vec![0.0, 1.0]],
        };
        let analyzer = CoverageAnalyzer::new(&embedding);
        let report = analyzer
            .analyze(&chunks, &pairs, "demo", ThresholdSet::default(), None)
            .await
            .unwrap();
        assert_eq!(report.covered_chunks, 0);
        assert_eq!(report.multi_threshold.lenient.uncovered.len(), 1);
    }

    #[tokio::test]
    async fn test_no_qa_pairs_leaves_chunks_uncovered() {
        let chunks = vec![chunk("doc-1", 0, 50)];
        let embedding = FixedEmbedding { chunk_vecs: vec![vec![1.0, 0.0]], qa_vecs: vec![] };
        let analyzer = CoverageAnalyzer::new(&embedding);
        let report = analyzer
            .analyze(&chunks, &[], "demo", ThresholdSet::default(), None)
            .await
            .unwrap();
        assert_eq!(report.max_similarities, vec![0.0]);
        assert_eq!(report.covered_chunks, 0);
    }

    #[test]
    fn test_position_bucket_boundaries() {
        let mut doc_sizes = BTreeMap::new();
        doc_sizes.insert("doc-1".to_string(), 10);
        assert_eq!(position_bucket(&chunk("doc-1", 0, 50), &doc_sizes), "beginning");
        assert_eq!(position_bucket(&chunk("doc-1", 5, 50), &doc_sizes), "middle");
        assert_eq!(position_bucket(&chunk("doc-1", 7, 50), &doc_sizes), "end");
    }

    #[test]
    fn test_collect_insights_below_floor() {
        let mut buckets = BTreeMap::new();
        buckets.insert("short".to_string(), BucketStats::new(10, 3));
        let mut insights = Vec::new();
        collect_insights(&buckets, "chunks", &mut insights);
        assert_eq!(insights.len(), 1);
        assert!(insights[0].contains("short"));
    }

    #[test]
    fn test_collect_insights_above_floor_is_silent() {
        let mut buckets = BTreeMap::new();
        buckets.insert("short".to_string(), BucketStats::new(10, 9));
        let mut insights = Vec::new();
        collect_insights(&buckets, "chunks", &mut insights);
        assert!(insights.is_empty());
    }
}
