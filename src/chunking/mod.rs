//! Document chunking: splits documents into ordered, tokenized chunks and
//! coalesces undersized adjacent chunks.

pub mod merger;
pub mod semantic;
pub mod traits;

pub use merger::merge;
pub use semantic::SemanticChunker;
pub use traits::{ChunkBounds, Chunker};

/// Default token budget per chunk before merging.
pub const DEFAULT_MAX_TOKENS: usize = 400;

/// Default minimum token budget a chunk should meet after merging.
pub const DEFAULT_MIN_TOKENS: usize = 150;
