//! Chunker trait definition.
//!
//! Defines the interface chunking strategies implement, so the pipeline can
//! swap the splitting algorithm without touching callers.

use crate::core::{Chunk, Document};
use crate::error::Result;

/// Bounds a chunker operates under.
#[derive(Debug, Clone, Copy)]
pub struct ChunkBounds {
    /// Upper bound on tokens per chunk (forced splits may exceed this).
    pub max_tokens: usize,
    /// Lower bound a chunk should meet after merging.
    pub min_tokens: usize,
    /// Whether to prefer paragraph boundaries before falling back to
    /// sentence grouping.
    pub prefer_paragraphs: bool,
}

impl ChunkBounds {
    /// Creates new bounds, preferring paragraph splitting.
    #[must_use]
    pub const fn new(min_tokens: usize, max_tokens: usize) -> Self {
        Self {
            max_tokens,
            min_tokens,
            prefer_paragraphs: true,
        }
    }

    /// Disables paragraph-preferred splitting, going straight to sentence
    /// grouping.
    #[must_use]
    pub const fn without_paragraphs(mut self) -> Self {
        self.prefer_paragraphs = false;
        self
    }
}

/// Trait for chunking a document into an ordered sequence of [`Chunk`]s.
///
/// Implementations must be `Send + Sync` and deterministic: the same
/// document and bounds must always yield the same chunks.
pub trait Chunker: Send + Sync {
    /// Splits `document` into chunks under the given bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if `bounds` are internally inconsistent
    /// (`min_tokens >= max_tokens`).
    fn split(&self, document: &Document, doc_index: usize, bounds: ChunkBounds)
    -> Result<Vec<Chunk>>;

    /// Returns the name of the chunking strategy.
    fn name(&self) -> &'static str;
}
