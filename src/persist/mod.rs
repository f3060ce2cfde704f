//! Writes run outputs: Q/A artifacts on disk, and (optionally) vectors into
//! an external store for later semantic search.

pub mod artifacts;
pub mod vector_store;

pub use artifacts::{write_run_outputs, ArtifactPaths, RunSummary};
pub use vector_store::{build_point, point_id, Point, PointPayload, QdrantVectorStore};

use std::path::{Path, PathBuf};

use crate::core::{CoverageReport, QAPair};
use crate::error::Result;
use crate::provider::embedding::EmbeddingProvider;

/// Orchestrates writing every artifact for a run, and optionally pushing
/// embedded pairs into a vector store collection.
pub struct Persistor<'a> {
    output_dir: PathBuf,
    vector_store: Option<&'a QdrantVectorStore>,
}

impl<'a> Persistor<'a> {
    /// Builds a persistor that writes artifacts under `output_dir` and, if
    /// `vector_store` is given, also pushes embedded pairs there.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, vector_store: Option<&'a QdrantVectorStore>) -> Self {
        Self {
            output_dir: output_dir.into(),
            vector_store,
        }
    }

    /// Writes the Q/A and coverage artifacts for a run, returning their
    /// summary.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::PersistError`] if any artifact fails to
    /// write.
    pub fn write_artifacts(
        &self,
        timestamp: &str,
        pairs: &[QAPair],
        coverage: Option<&CoverageReport>,
        success_count: usize,
        failure_count: usize,
        error_count: usize,
    ) -> Result<RunSummary> {
        artifacts::write_run_outputs(
            &self.output_dir,
            timestamp,
            pairs,
            coverage,
            success_count,
            failure_count,
            error_count,
        )
    }

    /// Embeds every pair's `question + " " + answer` text and upserts the
    /// resulting points into `collection`, recreating it first with the
    /// embedding provider's native dimensionality. No-op if this persistor
    /// was built without a vector store.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::Error`] if embedding or the HTTP upsert
    /// fails.
    pub async fn push_vectors(
        &self,
        collection: &str,
        dataset_tag: &str,
        pairs: &[QAPair],
        embedding: &dyn EmbeddingProvider,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        let Some(store) = self.vector_store else {
            return Ok(());
        };
        if pairs.is_empty() {
            return Ok(());
        }

        store.recreate_collection(collection, embedding.dimensions()).await?;
        store.index_domain_field(collection).await?;

        let texts: Vec<String> = pairs.iter().map(|p| format!("{} {}", p.question, p.answer)).collect();
        let vectors = embedding.embed_batch(&texts).await?;

        let points: Vec<Point> = pairs
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(row_index, (pair, vector))| {
                build_point(
                    dataset_tag,
                    &pair.question,
                    &pair.answer,
                    &pair.source_chunk_id,
                    row_index,
                    vector,
                    created_at,
                )
            })
            .collect();

        store.upsert_batch(collection, &points).await
    }

    /// The directory artifacts are written under.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
