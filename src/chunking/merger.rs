//! Coalesces undersized adjacent chunks within the same document.

use crate::core::{Chunk, OriginKind};
use crate::tokenizer::TextTokenizer;

/// Merges undersized adjacent chunks, never crossing document boundaries.
///
/// Walks `chunks` in order, keeping at most one "pending" undersized chunk.
/// A chunk at or above `min_tokens` flushes any pending chunk and is emitted
/// as-is. An undersized chunk either becomes the new pending chunk, or is
/// merged into the existing pending chunk if they share a `doc_id` and their
/// combined token count does not exceed `max_tokens`. A pending chunk that
/// cannot be merged further — because of a document boundary, the
/// `max_tokens` bound, or simply because the input ran out — is flushed
/// as-is; this residual may remain below `min_tokens`.
#[must_use]
pub fn merge(chunks: Vec<Chunk>, min_tokens: usize, max_tokens: usize) -> Vec<Chunk> {
    let tokenizer = TextTokenizer::new();
    let mut output = Vec::with_capacity(chunks.len());
    let mut pending: Option<Chunk> = None;

    for chunk in chunks {
        if chunk.meets_min(min_tokens) {
            if let Some(p) = pending.take() {
                output.push(p);
            }
            output.push(chunk);
            continue;
        }

        let Some(p) = pending.take() else {
            pending = Some(chunk);
            continue;
        };

        if p.doc_id == chunk.doc_id && p.token_count + chunk.token_count <= max_tokens {
            pending = Some(merge_pair(&tokenizer, p, chunk));
        } else {
            output.push(p);
            pending = Some(chunk);
        }
    }

    if let Some(p) = pending {
        output.push(p);
    }

    output
}

/// Concatenates `second` onto `first` with a paragraph separator, recording
/// both ids in `merged_of` and recomputing the token count with the shared
/// tokenizer.
fn merge_pair(tokenizer: &TextTokenizer, first: Chunk, second: Chunk) -> Chunk {
    let text = format!("{}\n\n{}", first.text, second.text);
    let token_count = tokenizer.count(&text);

    let mut merged_of = first.merged_of.unwrap_or_else(|| vec![first.chunk_id.clone()]);
    merged_of.push(second.chunk_id);

    let mut sentences = first.sentences;
    sentences.extend(second.sentences);

    Chunk {
        chunk_id: first.chunk_id,
        doc_id: first.doc_id,
        doc_index: first.doc_index,
        chunk_index: first.chunk_index,
        text,
        token_count,
        origin_kind: OriginKind::Merged,
        sentences,
        merged_of: Some(merged_of),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc_id: &str, index: usize, tokens: usize) -> Chunk {
        Chunk::new(
            doc_id,
            0,
            index,
            "x".repeat(tokens),
            tokens,
            OriginKind::Paragraph,
            vec!["x".to_string()],
        )
    }

    #[test]
    fn test_no_undersized_chunks_is_unchanged() {
        let chunks = vec![chunk("d1", 0, 200), chunk("d1", 1, 200)];
        let merged = merge(chunks.clone(), 100, 400);
        assert_eq!(merged, chunks);
    }

    #[test]
    fn test_two_undersized_merge() {
        let chunks = vec![chunk("d1", 0, 20), chunk("d1", 1, 20)];
        let merged = merge(chunks, 100, 400);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].origin_kind, OriginKind::Merged);
        assert_eq!(
            merged[0].merged_of.as_ref().unwrap().len(),
            2
        );
    }

    #[test]
    fn test_merge_never_crosses_document_boundary() {
        let chunks = vec![chunk("d1", 0, 20), chunk("d2", 0, 20)];
        let merged = merge(chunks, 100, 400);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].merged_of.is_none());
        assert!(merged[1].merged_of.is_none());
    }

    #[test]
    fn test_singleton_residual_allowed() {
        let chunks = vec![chunk("d1", 0, 200), chunk("d1", 1, 20)];
        let merged = merge(chunks, 100, 400);
        assert_eq!(merged.len(), 2);
        assert!(merged[1].token_count < 100);
    }

    #[test]
    fn test_merge_respects_max_tokens_bound() {
        let chunks = vec![chunk("d1", 0, 250), chunk("d1", 1, 250)];
        let merged = merge(chunks, 300, 400);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let chunks = vec![chunk("d1", 0, 20), chunk("d1", 1, 20), chunk("d1", 2, 300)];
        let once = merge(chunks, 100, 400);
        let twice = merge(once.clone(), 100, 400);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let merged = merge(Vec::new(), 100, 400);
        assert!(merged.is_empty());
    }
}
