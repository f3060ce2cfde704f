//! Semantic chunking: splits a document preferring paragraph boundaries,
//! falling back to sentence grouping, and finally forced splits.

use crate::chunking::traits::{ChunkBounds, Chunker};
use crate::core::{Chunk, Document, OriginKind};
use crate::error::{ChunkingError, Result};
use crate::tokenizer::TextTokenizer;

/// Splits documents preferring paragraph, then sentence, then forced
/// boundaries, per the chunking algorithm.
#[derive(Debug, Clone, Default)]
pub struct SemanticChunker {
    tokenizer: TextTokenizer,
}

impl SemanticChunker {
    /// Creates a new semantic chunker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokenizer: TextTokenizer::new(),
        }
    }

    /// Splits `text` on blank lines into non-empty, non-whitespace paragraphs.
    fn split_paragraphs(text: &str) -> Vec<&str> {
        text.split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Splits `text` into sentences on `terminator`, keeping the terminator
    /// attached to the sentence it ends. A trailing fragment with no
    /// terminator is counted as one sentence.
    fn split_sentences(text: &str, terminator: char) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut current = String::new();
        for c in text.chars() {
            current.push(c);
            if c == terminator {
                let trimmed = current.trim().to_string();
                if !trimmed.is_empty() {
                    sentences.push(trimmed);
                }
                current.clear();
            }
        }
        let trimmed = current.trim().to_string();
        if !trimmed.is_empty() {
            sentences.push(trimmed);
        }
        sentences
    }

    /// Greedily groups sentences into chunks of at most `max_tokens`.
    /// A single sentence exceeding `max_tokens` is emitted alone, flagged by
    /// the caller as `forced_split`.
    fn group_sentences(&self, sentences: &[String], max_tokens: usize) -> Vec<(String, Vec<String>, bool)> {
        let mut groups = Vec::new();
        let mut current_text = String::new();
        let mut current_sentences = Vec::new();
        let mut current_tokens = 0usize;

        for sentence in sentences {
            let sentence_tokens = self.tokenizer.count(sentence);

            if sentence_tokens > max_tokens {
                if !current_sentences.is_empty() {
                    groups.push((current_text.clone(), current_sentences.clone(), false));
                    current_text.clear();
                    current_sentences.clear();
                    current_tokens = 0;
                }
                groups.push((sentence.clone(), vec![sentence.clone()], true));
                continue;
            }

            if current_tokens + sentence_tokens > max_tokens && !current_sentences.is_empty() {
                groups.push((current_text.clone(), current_sentences.clone(), false));
                current_text.clear();
                current_sentences.clear();
                current_tokens = 0;
            }

            if !current_text.is_empty() {
                current_text.push(' ');
            }
            current_text.push_str(sentence);
            current_sentences.push(sentence.clone());
            current_tokens += sentence_tokens;
        }

        if !current_sentences.is_empty() {
            groups.push((current_text, current_sentences, false));
        }

        groups
    }
}

impl Chunker for SemanticChunker {
    fn split(
        &self,
        document: &Document,
        doc_index: usize,
        bounds: ChunkBounds,
    ) -> Result<Vec<Chunk>> {
        if bounds.min_tokens >= bounds.max_tokens {
            return Err(ChunkingError::BoundsInverted {
                min: bounds.min_tokens,
                max: bounds.max_tokens,
            }
            .into());
        }

        if document.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let terminator = document.language.terminator();
        let candidates: Vec<&str> = if bounds.prefer_paragraphs {
            Self::split_paragraphs(&document.text)
        } else {
            vec![document.text.trim()]
        };

        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;

        for candidate in candidates {
            let candidate_tokens = self.tokenizer.count(candidate);

            if candidate_tokens <= bounds.max_tokens {
                chunks.push(Chunk::new(
                    document.doc_id.clone(),
                    doc_index,
                    chunk_index,
                    candidate,
                    candidate_tokens,
                    OriginKind::Paragraph,
                    vec![candidate.to_string()],
                ));
                chunk_index += 1;
                continue;
            }

            let sentences = Self::split_sentences(candidate, terminator);
            let groups = self.group_sentences(&sentences, bounds.max_tokens);

            for (text, group_sentences, forced) in groups {
                let token_count = self.tokenizer.count(&text);
                let origin_kind = if forced {
                    OriginKind::ForcedSplit
                } else {
                    OriginKind::SentenceGroup
                };
                chunks.push(Chunk::new(
                    document.doc_id.clone(),
                    doc_index,
                    chunk_index,
                    text,
                    token_count,
                    origin_kind,
                    group_sentences,
                ));
                chunk_index += 1;
            }
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "semantic"
    }
}
