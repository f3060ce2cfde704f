//! Explicit provider selection, replacing module-level singleton clients.

use std::env;
use std::sync::Arc;

use crate::error::{Error, ProviderError};
use crate::provider::embedding::{EmbeddingProvider, GeminiEmbeddingProvider, OpenAiEmbeddingProvider};
use crate::provider::llm::{GeminiLlmProvider, LlmProvider, OpenAiLlmProvider};
use crate::tokenizer::TextTokenizer;

/// Holds the selected LLM provider, embedding provider, and shared tokenizer
/// for a run. Passed explicitly through constructors rather than reached for
/// as a global.
#[derive(Clone)]
pub struct ProviderRegistry {
    llm: Arc<dyn LlmProvider>,
    embedding: Arc<dyn EmbeddingProvider>,
    tokenizer: TextTokenizer,
}

impl ProviderRegistry {
    /// Builds a registry from explicit provider instances.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, embedding: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            llm,
            embedding,
            tokenizer: TextTokenizer::new(),
        }
    }

    /// Builds a registry by reading `LLM_PROVIDER` and `EMBEDDING_PROVIDER`
    /// (each one of `gemini` or `openai`) and the matching API key variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is unset or names an unknown
    /// provider tag.
    pub fn from_env() -> Result<Self, Error> {
        let llm = match provider_tag("LLM_PROVIDER")?.as_str() {
            "openai" => {
                let model = env::var("OPENAI_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
                Arc::new(OpenAiLlmProvider::new(model)) as Arc<dyn LlmProvider>
            }
            "gemini" => {
                let key = require_env("GEMINI_API_KEY")?;
                let model = env::var("GEMINI_LLM_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
                Arc::new(GeminiLlmProvider::new(key, model)) as Arc<dyn LlmProvider>
            }
            other => return Err(unknown_provider_tag("LLM_PROVIDER", other)),
        };

        let embedding = match provider_tag("EMBEDDING_PROVIDER")?.as_str() {
            "openai" => Arc::new(OpenAiEmbeddingProvider::new()) as Arc<dyn EmbeddingProvider>,
            "gemini" => {
                let key = require_env("GEMINI_API_KEY")?;
                Arc::new(GeminiEmbeddingProvider::new(key)) as Arc<dyn EmbeddingProvider>
            }
            other => return Err(unknown_provider_tag("EMBEDDING_PROVIDER", other)),
        };

        Ok(Self::new(llm, embedding))
    }

    /// The selected LLM provider.
    #[must_use]
    pub fn llm(&self) -> Arc<dyn LlmProvider> {
        Arc::clone(&self.llm)
    }

    /// The selected embedding provider.
    #[must_use]
    pub fn embedding(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embedding)
    }

    /// The shared tokenizer used by chunker, merger, and allocator.
    #[must_use]
    pub fn tokenizer(&self) -> &TextTokenizer {
        &self.tokenizer
    }
}

fn provider_tag(var: &str) -> Result<String, Error> {
    Ok(require_env(var)?.to_lowercase())
}

fn require_env(var: &str) -> Result<String, Error> {
    env::var(var).map_err(|_| Error::Config {
        message: format!("environment variable {var} is not set"),
    })
}

fn unknown_provider_tag(var: &str, tag: &str) -> Error {
    ProviderError::MissingConfig(format!("{var}={tag} is not a recognized provider")).into()
}
