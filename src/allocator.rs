//! Decides how many Q/A pairs to request per chunk.

use crate::core::Chunk;

/// Closed range of Q/A pairs a single chunk may be asked to produce.
pub const MIN_PAIRS: usize = 1;
/// Closed range of Q/A pairs a single chunk may be asked to produce.
pub const MAX_PAIRS: usize = 8;

/// Zero-based chunk position within a document at or beyond which the
/// late-document compensation bonus applies.
const LATE_DOCUMENT_POSITION: usize = 5;

/// Per-dataset tunables the allocator consults.
#[derive(Debug, Clone, Copy)]
pub struct DatasetDefaults {
    /// Base count `b` used by the mid-range and upper tiers.
    pub base: usize,
}

impl Default for DatasetDefaults {
    fn default() -> Self {
        Self { base: 2 }
    }
}

/// Chooses a Q/A pair count for a chunk from its token count and position.
#[derive(Debug, Clone, Copy, Default)]
pub struct QACountPolicy;

impl QACountPolicy {
    /// Creates a new policy. Stateless; the dataset defaults are passed per
    /// call so the same policy serves every dataset in a run.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Chooses the requested Q/A count for `chunk`, clamped to
    /// `[MIN_PAIRS, MAX_PAIRS]`.
    #[must_use]
    pub fn choose(&self, chunk: &Chunk, defaults: DatasetDefaults) -> usize {
        let t = chunk.token_count;
        let b = defaults.base;

        let mut count = if t < 50 {
            2
        } else if t < 100 {
            3
        } else if t < 200 {
            b + 1
        } else if t < 300 {
            b + 2
        } else {
            b + 3
        };

        if chunk.chunk_index >= LATE_DOCUMENT_POSITION {
            count += 1;
        }

        count.clamp(MIN_PAIRS, MAX_PAIRS)
    }
}
