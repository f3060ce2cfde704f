//! Provider abstractions: LLM-driven Q/A synthesis and text embedding.
//!
//! Both capabilities are kept behind small trait interfaces so the pipeline
//! is LLM- and vector-store-agnostic; concrete providers are selected at
//! runtime by [`registry::ProviderRegistry`].

pub mod embedding;
pub mod llm;
pub mod registry;

pub use embedding::{EmbeddingProvider, cosine_similarity};
pub use llm::{GeneratedQAPair, GeneratedQASet, LlmProvider};
pub use registry::ProviderRegistry;

/// Upper character bound text is truncated to before prompting, to contain
/// cost and latency. The source sometimes used 1,000 and sometimes 2,000;
/// this picks 2,000 as the single tunable cap.
pub const PROMPT_TRUNCATE_CHARS: usize = 2_000;
