//! Q/A pair representation: one question and one answer synthesized from a
//! single chunk.

use serde::{Deserialize, Serialize};

/// The closed set of question shapes a worker may request or return.
///
/// Parsers reject any value outside this enum rather than accepting an
/// arbitrary string, per the "dynamic dispatch -> tagged variants" redesign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Asks for a stated fact from the text.
    Fact,
    /// Asks for a reason or cause behind something in the text.
    Reason,
    /// Asks the reader to compare two things mentioned in the text.
    Comparison,
    /// Asks the reader to apply the text's content to a new situation.
    Application,
}

impl QuestionType {
    /// All question types, in the order prompts should name them.
    pub const ALL: [Self; 4] = [Self::Fact, Self::Reason, Self::Comparison, Self::Application];
}

/// A single question/answer pair synthesized from exactly one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QAPair {
    /// The generated question.
    pub question: String,
    /// The generated answer.
    pub answer: String,
    /// The kind of question this is.
    pub question_type: QuestionType,
    /// Id of the chunk this pair was synthesized from.
    pub source_chunk_id: String,
    /// Owning document id (denormalized from the chunk for easy filtering).
    pub doc_id: String,
    /// Dataset tag this run was invoked with.
    pub dataset_tag: String,
    /// Position of the source chunk within its document.
    pub chunk_index: usize,
    /// Tag identifying which LLM provider produced this pair.
    pub provider_tag: Option<String>,
}
