//! # qa-forge
//!
//! Semantic chunking, distributed Q/A synthesis, and coverage-analyzed
//! vector ingestion.
//!
//! A document corpus is read, split into semantically coherent chunks,
//! and dispatched to a pool of LLM-backed workers that synthesize
//! question/answer pairs from each chunk. An optional coverage pass
//! embeds both chunks and pairs to report how well the generated Q/A set
//! covers the source material, bucketed by chunk length and position.
//!
//! ## Features
//!
//! - **Semantic chunking**: paragraph-first, sentence-fallback splitting
//!   with undersized-chunk merging
//! - **Distributed dispatch**: a durable-broker-backed worker pool with
//!   per-task retry and a two-phase result collector
//! - **Coverage analysis**: cosine-similarity coverage of chunks by the
//!   generated Q/A set, bucketed and thresholded
//! - **Pluggable providers**: LLM and embedding backends selected at
//!   runtime behind small trait interfaces

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod allocator;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod coverage;
pub mod dispatcher;
pub mod error;
pub mod io;
pub mod persist;
pub mod provider;
pub mod tokenizer;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Chunk, CoverageReport, Document, OriginKind, QAPair, QuestionType};

// Re-export chunking types
pub use chunking::{ChunkBounds, Chunker, SemanticChunker};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export provider types
pub use provider::{EmbeddingProvider, LlmProvider, ProviderRegistry};

// Re-export dispatcher types
pub use dispatcher::TaskDispatcher;

// Re-export persistence types
pub use persist::Persistor;
