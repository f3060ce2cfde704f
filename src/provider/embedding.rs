//! Embedding provider capability: dense vector representations of chunk and
//! question text, used for coverage analysis and vector store persistence.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::error::Result;

/// OpenAI's `text-embedding-3-small` dimensionality.
pub const OPENAI_DIMENSIONS: usize = 1536;
/// Gemini's `gemini-embedding-001` dimensionality.
pub const GEMINI_DIMENSIONS: usize = 3072;

/// Capability set every embedding backend exposes.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Tag identifying this provider in persisted records (`openai`, `gemini`).
    fn tag(&self) -> &'static str;

    /// The fixed length every embedding this provider returns will have.
    fn dimensions(&self) -> usize;

    /// Embeds a single string.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Timeout`] or [`ProviderError::Transient`].
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds a batch of strings, in order.
    ///
    /// The default implementation embeds sequentially; providers whose API
    /// supports true batch calls should override this.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Timeout`] or [`ProviderError::Transient`].
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_text(text).await?);
        }
        Ok(out)
    }
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns a value between -1.0 (opposite) and 1.0 (identical); returns 0.0
/// for mismatched lengths or a zero-magnitude vector rather than panicking.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// OpenAI-style embedding provider.
pub struct OpenAiEmbeddingProvider {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingProvider {
    /// Creates a provider using `text-embedding-3-small` and the
    /// `OPENAI_API_KEY` environment variable.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: async_openai::Client::new(),
            model: "text-embedding-3-small".to_string(),
            dimensions: OPENAI_DIMENSIONS,
        }
    }
}

impl Default for OpenAiEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn tag(&self) -> &'static str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::EmptyOutput.into())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        use async_openai::types::CreateEmbeddingRequestArgs;

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Gemini-style embedding provider, speaking the
/// `generativelanguage.googleapis.com` REST API directly over `reqwest`.
pub struct GeminiEmbeddingProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Creates a provider using `gemini-embedding-001`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "gemini-embedding-001".to_string(),
            dimensions: GEMINI_DIMENSIONS,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn tag(&self) -> &'static str {
        "gemini"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:embedContent?key={}",
            self.model, self.api_key
        );

        #[derive(serde::Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(serde::Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(serde::Serialize)]
        struct EmbedRequest<'a> {
            content: Content<'a>,
        }
        #[derive(Deserialize)]
        struct Embedding {
            values: Vec<f32>,
        }
        #[derive(Deserialize)]
        struct EmbedResponse {
            embedding: Embedding,
        }

        let body = EmbedRequest {
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let response: EmbedResponse = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from)?
            .json()
            .await
            .map_err(ProviderError::from)?;

        Ok(response.embedding.values)
    }
}
