//! Core domain models for the Q/A synthesis pipeline.
//!
//! These are pure domain models with no I/O dependencies: documents flow in,
//! chunks are derived from them, Q/A pairs are derived from chunks, tasks
//! track the synthesis of those pairs, and a coverage report summarizes how
//! well the pairs cover the chunks.

pub mod chunk;
pub mod coverage;
pub mod document;
pub mod qapair;
pub mod task;

pub use chunk::{Chunk, OriginKind};
pub use coverage::{BucketStats, ChunkAnalysis, CoverageReport, MultiThreshold, ThresholdReport, ThresholdSet, UncoveredChunk};
pub use document::{Document, Language};
pub use qapair::{QAPair, QuestionType};
pub use task::{Task, TaskResult, TaskStatus};
