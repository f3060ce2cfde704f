//! Shared deterministic token counting.
//!
//! The chunker, merger, and allocator must all agree on what a "token" is,
//! or their size decisions drift apart. [`TextTokenizer`] is the single rule
//! all three consult; it makes no network calls and is fully deterministic.

use unicode_segmentation::UnicodeSegmentation;

/// Counts tokens in a provider-stable way.
///
/// The rule approximates subword tokenization without depending on any
/// specific vocabulary: it counts Unicode word-like segments (numbers,
/// letters runs) plus one token per isolated punctuation or symbol
/// character, which tracks BPE-style tokenizers closely enough for sizing
/// decisions without needing their vocabularies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTokenizer;

impl TextTokenizer {
    /// Creates a new tokenizer. Stateless; exists for call-site symmetry
    /// with the other pipeline components that do carry state.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Counts the tokens in `text`.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        text.split_word_bounds()
            .filter(|w| !w.trim().is_empty())
            .count()
    }
}
