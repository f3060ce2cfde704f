//! Document representation: the unit of ingest for the pipeline.

use serde::{Deserialize, Serialize};

/// Source language of a document, used to pick a sentence terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Japanese — sentences terminate on `。`.
    Ja,
    /// English — sentences terminate on `.`.
    En,
}

impl Language {
    /// Returns the sentence-terminating character for this language.
    #[must_use]
    pub const fn terminator(self) -> char {
        match self {
            Self::Ja => '。',
            Self::En => '.',
        }
    }
}

/// An ingested document, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, unique within a run.
    pub doc_id: String,
    /// Raw text content.
    pub text: String,
    /// Source language.
    pub language: Language,
    /// Optional human-readable title.
    pub title: Option<String>,
}

impl Document {
    /// Creates a new document.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, text: impl Into<String>, language: Language) -> Self {
        Self {
            doc_id: doc_id.into(),
            text: text.into(),
            language,
            title: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_terminator() {
        assert_eq!(Language::Ja.terminator(), '。');
        assert_eq!(Language::En.terminator(), '.');
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new("doc-1", "hello", Language::En);
        assert_eq!(doc.doc_id, "doc-1");
        assert_eq!(doc.text, "hello");
        assert!(doc.title.is_none());
    }

    #[test]
    fn test_document_with_title() {
        let doc = Document::new("doc-1", "hello", Language::En).with_title("Greeting");
        assert_eq!(doc.title, Some("Greeting".to_string()));
    }

    #[test]
    fn test_document_serialization_roundtrip() {
        let doc = Document::new("doc-1", "hello", Language::Ja).with_title("t");
        let json = serde_json::to_string(&doc).unwrap_or_default();
        let back: Document = serde_json::from_str(&json).unwrap_or_else(|_| doc.clone());
        assert_eq!(back, doc);
    }
}
