//! LLM provider capability: structured and free-form Q/A generation.

use async_openai::Client as OpenAiClient;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::QuestionType;
use crate::error::{ProviderError, Result};
use crate::io::find_char_boundary;
use crate::provider::PROMPT_TRUNCATE_CHARS;

/// One Q/A pair as returned by a provider, before it is stamped with the
/// source chunk's identifying fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQAPair {
    /// The generated question.
    pub question: String,
    /// The generated answer.
    pub answer: String,
    /// The kind of question this is.
    pub question_type: QuestionType,
}

/// The schema a structured generation call returns: `{qa_pairs: [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedQASet {
    /// The generated pairs, in provider-returned order.
    pub qa_pairs: Vec<GeneratedQAPair>,
}

const SYSTEM_INSTRUCTION: &str =
    "You generate learning Q/A pairs. Be concise and faithful to the text. \
     Each question must be one of: fact, reason, comparison, application.";

/// Capability set every LLM backend exposes.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Tag identifying this provider in persisted records (`openai`, `gemini`).
    fn tag(&self) -> &'static str;

    /// Requests a schema-validated Q/A object for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Timeout`], [`ProviderError::Transient`], or
    /// [`ProviderError::SchemaMismatch`] on failure.
    async fn generate_structured(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
    ) -> Result<GeneratedQASet>;

    /// Requests free-form text for `prompt`, used as a fallback when
    /// structured generation fails.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Timeout`] or [`ProviderError::Transient`].
    async fn generate_text(&self, prompt: &str, model_hint: Option<&str>) -> Result<String>;
}

/// Truncates `text` to [`PROMPT_TRUNCATE_CHARS`] at a valid char boundary.
#[must_use]
pub fn truncate_for_prompt(text: &str) -> &str {
    let end = find_char_boundary(text, PROMPT_TRUNCATE_CHARS);
    &text[..end]
}

/// Builds the user instruction for a single-chunk Q/A request.
#[must_use]
pub fn build_single_prompt(text: &str, requested_count: usize) -> String {
    format!(
        "Generate exactly {requested_count} question/answer pairs from the text below. \
         Use a mix of fact, reason, comparison, and application question types. \
         Return JSON matching {{\"qa_pairs\": [{{\"question\": ..., \"answer\": ..., \"question_type\": ...}}]}}.\n\n\
         <text>\n{}\n</text>",
        truncate_for_prompt(text)
    )
}

/// Builds the user instruction for a batched multi-chunk Q/A request.
///
/// Pairs returned by the provider are assigned in order to the numbered
/// texts; a chunk's requested count is consumed in sequence.
#[must_use]
pub fn build_batch_prompt(texts_and_counts: &[(&str, usize)]) -> String {
    let mut prompt = String::from(
        "Generate question/answer pairs for each numbered text below, in order. \
         Use a mix of fact, reason, comparison, and application question types. \
         Return JSON matching {\"qa_pairs\": [{\"question\": ..., \"answer\": ..., \"question_type\": ...}]} \
         with all pairs concatenated in text order.\n\n",
    );
    for (i, (text, count)) in texts_and_counts.iter().enumerate() {
        prompt.push_str(&format!(
            "<text index=\"{i}\" requested=\"{count}\">\n{}\n</text>\n\n",
            truncate_for_prompt(text)
        ));
    }
    prompt
}

/// Extracts the largest JSON object from free-form text and parses it as a
/// [`GeneratedQASet`].
///
/// # Errors
///
/// Returns [`ProviderError::SchemaMismatch`] if no valid object is found.
pub fn extract_qa_set(text: &str) -> Result<GeneratedQASet> {
    let Some(start) = text.find('{') else {
        return Err(ProviderError::SchemaMismatch("no JSON object found".to_string()).into());
    };
    let Some(end) = text.rfind('}') else {
        return Err(ProviderError::SchemaMismatch("no JSON object found".to_string()).into());
    };
    if end < start {
        return Err(ProviderError::SchemaMismatch("no JSON object found".to_string()).into());
    }
    serde_json::from_str(&text[start..=end])
        .map_err(|e| ProviderError::SchemaMismatch(e.to_string()).into())
}

/// OpenAI-style LLM provider.
pub struct OpenAiLlmProvider {
    client: OpenAiClient<OpenAIConfig>,
    default_model: String,
}

impl OpenAiLlmProvider {
    /// Creates a provider from the `OPENAI_API_KEY` environment variable.
    #[must_use]
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            client: OpenAiClient::new(),
            default_model: default_model.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlmProvider {
    fn tag(&self) -> &'static str {
        "openai"
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
    ) -> Result<GeneratedQASet> {
        let content = self
            .chat(prompt, model_hint, Some(ResponseFormat::JsonObject))
            .await?;
        serde_json::from_str(&content).map_err(|e| ProviderError::SchemaMismatch(e.to_string()).into())
    }

    async fn generate_text(&self, prompt: &str, model_hint: Option<&str>) -> Result<String> {
        self.chat(prompt, model_hint, None).await
    }
}

impl OpenAiLlmProvider {
    /// Issues a single chat completion, optionally in JSON mode.
    async fn chat(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
        response_format: Option<ResponseFormat>,
    ) -> Result<String> {
        let model = model_hint.unwrap_or(&self.default_model);
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(model).messages(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTION)
                .build()
                .map_err(|e| ProviderError::Transient(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| ProviderError::Transient(e.to_string()))?
                .into(),
        ]);
        if let Some(format) = response_format {
            builder.response_format(format);
        }
        let request = builder
            .build()
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::EmptyOutput.into())
    }
}

/// Gemini-style LLM provider, speaking the `generativelanguage.googleapis.com`
/// REST API directly over `reqwest` (no official Rust SDK is depended on).
pub struct GeminiLlmProvider {
    http: reqwest::Client,
    api_key: String,
    default_model: String,
}

impl GeminiLlmProvider {
    /// Creates a provider from an explicit API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            default_model: default_model.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiLlmProvider {
    fn tag(&self) -> &'static str {
        "gemini"
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
    ) -> Result<GeneratedQASet> {
        let text = self.call(prompt, model_hint, true).await?;
        serde_json::from_str(&text).map_err(|e| ProviderError::SchemaMismatch(e.to_string()).into())
    }

    async fn generate_text(&self, prompt: &str, model_hint: Option<&str>) -> Result<String> {
        self.call(prompt, model_hint, false).await
    }
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}
#[derive(Serialize)]
struct GeminiGenerationConfig {
    response_mime_type: &'static str,
}
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}
#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: String,
}
#[derive(Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiCandidatePart>,
}
#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}
#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

impl GeminiLlmProvider {
    /// Issues a single `generateContent` call, requesting JSON-mime output
    /// when `json_mode` is set.
    async fn call(&self, prompt: &str, model_hint: Option<&str>, json_mode: bool) -> Result<String> {
        let model = model_hint.unwrap_or(&self.default_model);
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent?key={}",
            self.api_key
        );

        let combined = format!("{SYSTEM_INSTRUCTION}\n\n{prompt}");
        let generation_config = json_mode.then_some(GeminiGenerationConfig {
            response_mime_type: "application/json",
        });
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: &combined }],
            }],
            generation_config,
        };

        let response: GeminiResponse = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from)?
            .json()
            .await
            .map_err(ProviderError::from)?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::EmptyOutput.into())
    }
}
