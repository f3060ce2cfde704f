//! Reads a corpus of documents from any of the four supported input
//! formats: CSV, line-delimited text, JSON (object or array), and
//! line-delimited JSON.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::core::{Document, Language};
use crate::error::{IoError, Result};
use crate::io::reader::FileReader;

/// Text fields checked, in priority order, when a row has no `Combined_Text`
/// column or key.
const TEXT_FIELDS: [&str; 6] = ["text", "content", "body", "document", "answer", "question"];

/// The four formats this reader recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma-separated values, one document per row.
    Csv,
    /// One document's full text per line.
    LineText,
    /// A single JSON object, or an array of JSON objects.
    Json,
    /// One JSON object per line.
    JsonLines,
}

impl InputFormat {
    /// Guesses a format from a file extension, defaulting to `None` for
    /// anything unrecognized (callers should fall back to content sniffing).
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
            Some("csv") => Some(Self::Csv),
            Some("txt") => Some(Self::LineText),
            Some("json") => Some(Self::Json),
            Some("jsonl" | "ndjson") => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// Sniffs a format from content when the extension is unrecognized.
    #[must_use]
    pub fn sniff(content: &str) -> Self {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            return Self::Json;
        }
        if trimmed.starts_with('{') {
            let first_line = trimmed.lines().next().unwrap_or(trimmed);
            if serde_json::from_str::<Value>(first_line).is_ok() && trimmed.lines().count() > 1 {
                return Self::JsonLines;
            }
            return Self::Json;
        }
        if trimmed.lines().next().is_some_and(|line| line.contains(',')) {
            return Self::Csv;
        }
        Self::LineText
    }
}

/// Reads every document out of `path`, picking a format from its extension
/// or, failing that, sniffing the content.
///
/// # Errors
///
/// Returns an [`IoError`] if the file cannot be read, or a
/// [`crate::error::Error`] if its content cannot be parsed as the detected
/// format.
pub fn read_documents_from_file(path: &Path) -> Result<Vec<Document>> {
    let content = FileReader::open(path)?.read_to_string()?;
    let format = InputFormat::from_extension(path).unwrap_or_else(|| InputFormat::sniff(&content));
    parse_documents(&content, format)
}

/// Parses `content` as `format` into documents, dropping empty rows and
/// assigning stable ids to sources that supply none.
///
/// # Errors
///
/// Returns an [`IoError::UnrecognizedFormat`]-shaped error if the content
/// does not parse as valid CSV or JSON for the requested format.
pub fn parse_documents(content: &str, format: InputFormat) -> Result<Vec<Document>> {
    match format {
        InputFormat::Csv => parse_csv(content),
        InputFormat::LineText => Ok(parse_line_text(content)),
        InputFormat::Json => parse_json(content),
        InputFormat::JsonLines => parse_json_lines(content),
    }
}

fn parse_csv(content: &str) -> Result<Vec<Document>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| IoError::Generic(format!("invalid CSV headers: {e}")))?
        .clone();

    let mut documents = Vec::new();
    for (row_index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| IoError::Generic(format!("invalid CSV row: {e}")))?;
        let fields: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.to_lowercase(), value.to_string()))
            .collect();

        if let Some(doc) = document_from_fields(&fields, row_index, "csv") {
            documents.push(doc);
        }
    }
    Ok(documents)
}

fn parse_line_text(content: &str) -> Vec<Document> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(row_index, line)| build_document(&stable_id(row_index, line), line.trim(), None, None))
        .collect()
}

fn parse_json(content: &str) -> Result<Vec<Document>> {
    let value: Value = serde_json::from_str(content).map_err(|e| IoError::Generic(format!("invalid JSON: {e}")))?;
    let objects: Vec<Value> = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => {
            return Err(IoError::Generic("expected a JSON object or array of objects".to_string()).into());
        }
    };

    let mut documents = Vec::new();
    for (row_index, object) in objects.into_iter().enumerate() {
        if let Some(doc) = document_from_json_value(&object, row_index) {
            documents.push(doc);
        }
    }
    Ok(documents)
}

fn parse_json_lines(content: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (row_index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(line).map_err(|e| IoError::Generic(format!("invalid JSON line {row_index}: {e}")))?;
        if let Some(doc) = document_from_json_value(&value, row_index) {
            documents.push(doc);
        }
    }
    Ok(documents)
}

fn document_from_json_value(value: &Value, row_index: usize) -> Option<Document> {
    let Value::Object(map) = value else {
        return None;
    };
    let fields: BTreeMap<String, String> = map
        .iter()
        .filter_map(|(key, value)| value.as_str().map(|s| (key.to_lowercase(), s.to_string())))
        .collect();
    document_from_fields(&fields, row_index, "json")
}

fn document_from_fields(fields: &BTreeMap<String, String>, row_index: usize, source_tag: &str) -> Option<Document> {
    let text = combined_text(fields)?;
    let doc_id = fields
        .get("doc_id")
        .or_else(|| fields.get("id"))
        .cloned()
        .unwrap_or_else(|| stable_id(row_index, &format!("{source_tag}:{text}")));
    let title = fields.get("title").cloned();
    let language = fields
        .get("language")
        .and_then(|tag| match tag.to_lowercase().as_str() {
            "ja" => Some(Language::Ja),
            "en" => Some(Language::En),
            _ => None,
        })
        .unwrap_or_else(|| detect_language(&text));

    Some(build_document(&doc_id, &text, title, Some(language)))
}

fn combined_text(fields: &BTreeMap<String, String>) -> Option<String> {
    if let Some(combined) = fields.get("combined_text") {
        if !combined.trim().is_empty() {
            return Some(combined.clone());
        }
    }

    let joined = TEXT_FIELDS
        .iter()
        .filter_map(|field| fields.get(*field))
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");

    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn build_document(doc_id: &str, text: &str, title: Option<String>, language: Option<Language>) -> Document {
    let language = language.unwrap_or_else(|| detect_language(text));
    let mut document = Document::new(doc_id, text, language);
    if let Some(title) = title {
        document = document.with_title(title);
    }
    document
}

/// Heuristic language detection: a document is classified `ja` when any
/// meaningful share of its characters fall in the hiragana, katakana, or CJK
/// ideograph ranges.
fn detect_language(text: &str) -> Language {
    let sample: Vec<char> = text.chars().take(500).collect();
    if sample.is_empty() {
        return Language::En;
    }
    let ja_count = sample
        .iter()
        .filter(|c| matches!(**c, '\u{3040}'..='\u{30FF}' | '\u{4E00}'..='\u{9FFF}'))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let ratio = ja_count as f32 / sample.len() as f32;
    if ratio > 0.1 {
        Language::Ja
    } else {
        Language::En
    }
}

/// Derives a stable id for a source that supplies none, from a running
/// counter plus a content hash so the same row always gets the same id.
fn stable_id(row_index: usize, content: &str) -> String {
    format!("doc-{row_index}-{:016x}", fnv1a_64(content.as_bytes()))
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;
    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_text_drops_empty_lines() {
        let docs = parse_line_text("first doc\n\nsecond doc\n");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "first doc");
    }

    #[test]
    fn test_parse_csv_prefers_combined_text_column() {
        let csv = "Combined_Text,text\n\"hello world\",\"ignored\"\n";
        let docs = parse_csv(csv).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "hello world");
    }

    #[test]
    fn test_parse_csv_falls_back_to_concatenated_fields() {
        let csv = "text,content\n\"part one\",\"part two\"\n";
        let docs = parse_csv(csv).unwrap();
        assert_eq!(docs[0].text, "part one\npart two");
    }

    #[test]
    fn test_parse_csv_drops_empty_rows() {
        let csv = "text\n\"\"\n\"real content\"\n";
        let docs = parse_csv(csv).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "real content");
    }

    #[test]
    fn test_parse_json_array_of_objects() {
        let json = r#"[{"text": "doc one"}, {"text": "doc two"}]"#;
        let docs = parse_json(json).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_parse_json_single_object() {
        let json = r#"{"text": "only doc"}"#;
        let docs = parse_json(json).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "only doc");
    }

    #[test]
    fn test_parse_json_lines() {
        let jsonl = "{\"text\": \"one\"}\n{\"text\": \"two\"}\n";
        let docs = parse_json_lines(jsonl).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_document_ids_are_stable_across_calls() {
        let a = parse_line_text("same content").remove(0);
        let b = parse_line_text("same content").remove(0);
        assert_eq!(a.doc_id, b.doc_id);
    }

    #[test]
    fn test_explicit_doc_id_is_honored() {
        let json = r#"{"doc_id": "custom-1", "text": "has an id"}"#;
        let docs = parse_json(json).unwrap();
        assert_eq!(docs[0].doc_id, "custom-1");
    }

    #[test]
    fn test_detect_language_japanese() {
        assert_eq!(detect_language("これは日本語のテキストです。"), Language::Ja);
    }

    #[test]
    fn test_detect_language_english() {
        assert_eq!(detect_language("This is English text."), Language::En);
    }

    #[test]
    fn test_sniff_detects_csv() {
        assert_eq!(InputFormat::sniff("a,b,c\n1,2,3\n"), InputFormat::Csv);
    }

    #[test]
    fn test_sniff_detects_json_array() {
        assert_eq!(InputFormat::sniff("[{\"text\":\"x\"}]"), InputFormat::Json);
    }

    #[test]
    fn test_from_extension_recognizes_all_four() {
        assert_eq!(InputFormat::from_extension(Path::new("a.csv")), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_extension(Path::new("a.txt")), Some(InputFormat::LineText));
        assert_eq!(InputFormat::from_extension(Path::new("a.json")), Some(InputFormat::Json));
        assert_eq!(InputFormat::from_extension(Path::new("a.jsonl")), Some(InputFormat::JsonLines));
    }
}
