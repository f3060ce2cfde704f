//! End-to-end and property tests for qa-forge.

#![allow(clippy::expect_used)]

use qa_forge::allocator::{DatasetDefaults, QACountPolicy, MAX_PAIRS, MIN_PAIRS};
use qa_forge::chunking::merger;
use qa_forge::chunking::traits::{ChunkBounds, Chunker};
use qa_forge::chunking::SemanticChunker;
use qa_forge::core::{Document, Language};

#[test]
fn test_semantic_chunker_respects_bounds_on_prose() {
    let text = "Paragraph one has a few sentences. It keeps going a bit. \
                And a little more.\n\n\
                Paragraph two is here. It also has content worth chunking.";
    let document = Document::new("doc-1", text, Language::En);
    let bounds = ChunkBounds::new(5, 40);
    let chunker = SemanticChunker::new();

    let chunks = chunker
        .split(&document, 0, bounds)
        .expect("chunking should succeed");

    assert!(!chunks.is_empty());
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.doc_id, "doc-1");
        assert_eq!(chunk.chunk_index, i);
        assert_eq!(chunk.chunk_id, format!("doc-1#{i}"));
    }
}

#[test]
fn test_semantic_chunker_rejects_inverted_bounds() {
    let document = Document::new("doc-1", "some text.", Language::En);
    let bounds = ChunkBounds::new(400, 100);
    let chunker = SemanticChunker::new();

    assert!(chunker.split(&document, 0, bounds).is_err());
}

#[test]
fn test_merge_never_crosses_document_boundary() {
    let doc_a = Document::new("doc-a", "Short one. Short two.", Language::En);
    let doc_b = Document::new("doc-b", "Short three. Short four.", Language::En);
    let chunker = SemanticChunker::new();
    let bounds = ChunkBounds::new(100, 400).without_paragraphs();

    let mut chunks = chunker.split(&doc_a, 0, bounds).expect("chunk doc-a");
    chunks.extend(chunker.split(&doc_b, 1, bounds).expect("chunk doc-b"));

    let merged = merger::merge(chunks, 100, 400);
    for chunk in &merged {
        let absorbed_ids = chunk.merged_of.iter().flatten();
        assert!(
            absorbed_ids.clone().all(|id| id.starts_with("doc-a#"))
                || absorbed_ids.all(|id| id.starts_with("doc-b#")),
            "a merged chunk must not absorb chunks from two different documents"
        );
    }
}

mod property_tests {
    use super::{DatasetDefaults, Document, Language, MAX_PAIRS, MIN_PAIRS, QACountPolicy};
    use proptest::prelude::*;
    use qa_forge::chunking::traits::{ChunkBounds, Chunker};
    use qa_forge::chunking::SemanticChunker;
    use qa_forge::chunking::merger;
    use qa_forge::core::{Chunk, OriginKind, Task};
    use qa_forge::persist::vector_store::point_id;
    use qa_forge::tokenizer::TextTokenizer;

    fn chunk_with(token_count: usize, chunk_index: usize) -> Chunk {
        Chunk::new(
            "doc-1",
            0,
            chunk_index,
            "x".repeat(token_count.max(1)),
            token_count,
            OriginKind::Paragraph,
            vec![],
        )
    }

    proptest! {
        #[test]
        fn qa_count_always_within_bounds(token_count in 0usize..2000, chunk_index in 0usize..20, base in 1usize..10) {
            let chunk = chunk_with(token_count, chunk_index);
            let defaults = DatasetDefaults { base };
            let count = QACountPolicy::new().choose(&chunk, defaults);
            prop_assert!(count >= MIN_PAIRS && count <= MAX_PAIRS);
        }

        #[test]
        fn qa_count_late_document_never_lower_than_early(token_count in 0usize..2000, base in 1usize..10) {
            let defaults = DatasetDefaults { base };
            let early = QACountPolicy::new().choose(&chunk_with(token_count, 0), defaults);
            let late = QACountPolicy::new().choose(&chunk_with(token_count, 5), defaults);
            prop_assert!(late >= early);
        }

        #[test]
        fn merge_is_idempotent(seed in "[a-z ]{0,300}") {
            let tokenizer = TextTokenizer::new();
            let chunks: Vec<Chunk> = seed
                .split("  ")
                .enumerate()
                .filter(|(_, s)| !s.is_empty())
                .map(|(i, s)| {
                    let token_count = tokenizer.count(s);
                    Chunk::new("doc-1", 0, i, s, token_count, OriginKind::Paragraph, vec![])
                })
                .collect();

            let once = merger::merge(chunks, 10, 100);
            let twice = merger::merge(once.clone(), 10, 100);
            prop_assert_eq!(once.len(), twice.len());
        }

        #[test]
        fn semantic_chunker_every_chunk_is_forced_split_or_within_max(
            text in "[a-zA-Z .]{1,500}",
            max_tokens in 20usize..200,
        ) {
            let document = Document::new("doc-1", text, Language::En);
            let bounds = ChunkBounds::new(5, max_tokens);
            let chunker = SemanticChunker::new();
            if let Ok(chunks) = chunker.split(&document, 0, bounds) {
                for chunk in &chunks {
                    prop_assert!(
                        chunk.token_count <= max_tokens
                            || chunk.origin_kind == OriginKind::ForcedSplit
                    );
                }
            }
        }

        #[test]
        fn task_attempts_remaining_flips_at_max(attempt_count in 0u8..10) {
            let mut task = Task::new("t-1", chunk_with(10, 0), 3);
            task.attempt_count = attempt_count;
            prop_assert_eq!(task.has_attempts_remaining(), attempt_count < 3);
        }

        #[test]
        fn point_id_unique_for_distinct_keys(
            domain_a in "[a-z]{1,8}", source_a in "[a-z#0-9]{1,8}", row_a in 0usize..50,
            domain_b in "[a-z]{1,8}", source_b in "[a-z#0-9]{1,8}", row_b in 0usize..50,
        ) {
            prop_assume!((&domain_a, &source_a, row_a) != (&domain_b, &source_b, row_b));
            let a = point_id(&domain_a, &source_a, row_a);
            let b = point_id(&domain_b, &source_b, row_b);
            prop_assert_ne!(a, b);
        }
    }
}

mod cli {
    use assert_cmd::Command;
    use predicates::prelude::*;

    #[test]
    fn version_subcommand_reports_name_and_version() {
        Command::cargo_bin("qa-forge")
            .expect("binary should build")
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("qa-forge"));
    }

    #[test]
    fn run_requires_dataset_or_input_file() {
        Command::cargo_bin("qa-forge")
            .expect("binary should build")
            .args(["run"])
            .assert()
            .failure();
    }

    #[test]
    fn run_rejects_both_dataset_and_input_file() {
        Command::cargo_bin("qa-forge")
            .expect("binary should build")
            .args(["run", "--dataset", "foo", "--input-file", "bar.jsonl"])
            .assert()
            .failure();
    }

    #[test]
    fn run_with_missing_dataset_file_exits_with_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        Command::cargo_bin("qa-forge")
            .expect("binary should build")
            .current_dir(&dir)
            .args(["run", "--dataset", "does-not-exist"])
            .assert()
            .code(1);
    }
}
