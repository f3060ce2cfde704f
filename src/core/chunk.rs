//! Chunk representation: an ordered slice of a document with provenance.

use serde::{Deserialize, Serialize};

/// How a chunk came to be shaped the way it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// Emitted directly from a blank-line-delimited paragraph.
    Paragraph,
    /// Emitted from a greedily-grouped run of sentences within a paragraph.
    SentenceGroup,
    /// A single sentence that still exceeded `max_tokens`; emitted unsplit.
    ForcedSplit,
    /// Produced by [`crate::chunking::ChunkMerger`] joining undersized chunks.
    Merged,
}

/// An ordered slice of a document's text, with tokenization and provenance
/// metadata attached by the chunker (and possibly replaced by the merger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Derived from `doc_id` + `chunk_index`; stable for the run.
    pub chunk_id: String,
    /// Owning document id.
    pub doc_id: String,
    /// Position of the owning document within the corpus being processed.
    pub doc_index: usize,
    /// Zero-based position of this chunk within its document.
    pub chunk_index: usize,
    /// Chunk text content.
    pub text: String,
    /// Token count under the shared [`crate::tokenizer::TextTokenizer`] rule.
    pub token_count: usize,
    /// How this chunk was produced.
    pub origin_kind: OriginKind,
    /// The sentences making up this chunk, in order.
    pub sentences: Vec<String>,
    /// If this chunk resulted from merging, the ids of the chunks it absorbed.
    pub merged_of: Option<Vec<String>>,
}

impl Chunk {
    /// Derives the stable chunk id for a document id and chunk index.
    #[must_use]
    pub fn derive_id(doc_id: &str, chunk_index: usize) -> String {
        format!("{doc_id}#{chunk_index}")
    }

    /// Creates a new chunk, computing its id from `doc_id` and `chunk_index`.
    #[must_use]
    pub fn new(
        doc_id: impl Into<String>,
        doc_index: usize,
        chunk_index: usize,
        text: impl Into<String>,
        token_count: usize,
        origin_kind: OriginKind,
        sentences: Vec<String>,
    ) -> Self {
        let doc_id = doc_id.into();
        let chunk_id = Self::derive_id(&doc_id, chunk_index);
        Self {
            chunk_id,
            doc_id,
            doc_index,
            chunk_index,
            text: text.into(),
            token_count,
            origin_kind,
            sentences,
            merged_of: None,
        }
    }

    /// Returns whether this chunk is at or above `min_tokens`.
    #[must_use]
    pub const fn meets_min(&self, min_tokens: usize) -> bool {
        self.token_count >= min_tokens
    }

    /// Returns the zero-based length bucket boundary used by the coverage
    /// analyzer: short (<100), medium (<200), or long (otherwise).
    #[must_use]
    pub fn length_bucket(&self) -> &'static str {
        if self.token_count < 100 {
            "short"
        } else if self.token_count < 200 {
            "medium"
        } else {
            "long"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(token_count: usize) -> Chunk {
        Chunk::new(
            "doc-1",
            0,
            3,
            "some text",
            token_count,
            OriginKind::Paragraph,
            vec!["some text".to_string()],
        )
    }

    #[test]
    fn test_derive_id() {
        assert_eq!(Chunk::derive_id("doc-1", 3), "doc-1#3");
    }

    #[test]
    fn test_new_sets_chunk_id() {
        let chunk = sample(10);
        assert_eq!(chunk.chunk_id, "doc-1#3");
        assert!(chunk.merged_of.is_none());
    }

    #[test]
    fn test_meets_min() {
        let chunk = sample(150);
        assert!(chunk.meets_min(100));
        assert!(!chunk.meets_min(200));
    }

    #[test]
    fn test_length_bucket() {
        assert_eq!(sample(50).length_bucket(), "short");
        assert_eq!(sample(150).length_bucket(), "medium");
        assert_eq!(sample(500).length_bucket(), "long");
    }

    #[test]
    fn test_chunk_serialization_roundtrip() {
        let mut chunk = sample(10);
        chunk.merged_of = Some(vec!["doc-1#1".to_string(), "doc-1#2".to_string()]);
        let json = serde_json::to_string(&chunk).unwrap_or_default();
        let back: Chunk = serde_json::from_str(&json).unwrap_or_else(|_| chunk.clone());
        assert_eq!(back, chunk);
    }
}
