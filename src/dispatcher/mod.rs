//! Distributed Q/A synthesis: submits one task per chunk to a broker-backed
//! worker pool and collects results with a two-phase protocol.

pub mod broker;
pub mod collector;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use crate::core::{Chunk, Task};
use crate::error::{Error, Result};
use crate::provider::llm::LlmProvider;

pub use broker::{Broker, InProcessBroker};
pub use collector::{clamp_timeout, CollectOutcome, Diagnostics};

/// Tunables for a dispatcher instance.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of concurrent workers draining the queue.
    pub worker_count: usize,
    /// Maximum chunks a single worker claims and prompts together.
    pub batch_size: usize,
    /// Model hint forwarded to the LLM provider, if any.
    pub model_hint: Option<String>,
    /// Whether workers sleep a small randomized interval before each call.
    pub jitter_enabled: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            batch_size: 1,
            model_hint: None,
            jitter_enabled: true,
        }
    }
}

/// A submitted run's task ids, used to collect results later.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    /// Ids of every task submitted in this call, in submission order.
    pub task_ids: Vec<String>,
}

/// Turns a list of merged chunks into completed Q/A pairs via a parallel
/// worker pool, with retry and partial-failure semantics.
pub struct TaskDispatcher {
    broker: Arc<dyn Broker>,
    llm: Arc<dyn LlmProvider>,
    config: DispatcherConfig,
}

impl TaskDispatcher {
    /// Builds a dispatcher over `broker` using `llm` as the synthesis
    /// provider for every worker.
    #[must_use]
    pub fn new(broker: Arc<dyn Broker>, llm: Arc<dyn LlmProvider>, config: DispatcherConfig) -> Self {
        Self { broker, llm, config }
    }

    /// Enqueues one task per chunk and spawns the worker pool in the
    /// background. Returns immediately; call [`TaskDispatcher::collect`]
    /// to wait for and gather results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if `chunks` and `requested_counts`
    /// have different lengths, or a [`crate::error::DispatchError`] if the
    /// broker cannot accept a task.
    pub async fn submit(
        &self,
        chunks: &[Chunk],
        requested_counts: &[usize],
        dataset_tag: &str,
    ) -> Result<DispatchHandle> {
        if chunks.len() != requested_counts.len() {
            return Err(Error::InvalidState {
                message: format!(
                    "chunk count ({}) does not match requested-count list ({})",
                    chunks.len(),
                    requested_counts.len()
                ),
            });
        }

        let mut task_ids = Vec::with_capacity(chunks.len());
        for (chunk, &count) in chunks.iter().zip(requested_counts) {
            let task_id = chunk.chunk_id.clone();
            self.broker.enqueue(Task::new(task_id.clone(), chunk.clone(), count)).await?;
            task_ids.push(task_id);
        }

        let provider_tag = self.llm.tag();
        for _ in 0..self.config.worker_count.max(1) {
            let broker = Arc::clone(&self.broker);
            let llm = Arc::clone(&self.llm);
            let dataset_tag = dataset_tag.to_string();
            let batch_size = self.config.batch_size;
            let model_hint = self.config.model_hint.clone();
            let jitter_enabled = self.config.jitter_enabled;

            tokio::spawn(async move {
                worker::run_worker_loop(
                    &*broker,
                    &*llm,
                    provider_tag,
                    &dataset_tag,
                    batch_size,
                    model_hint.as_deref(),
                    jitter_enabled,
                )
                .await;
            });
        }

        Ok(DispatchHandle { task_ids })
    }

    /// Waits for terminal state on every task in `handle` (or for `timeout`
    /// to expire), then aggregates pairs and diagnostics by reading the
    /// result store directly.
    pub async fn collect(&self, handle: DispatchHandle, timeout: Duration) -> CollectOutcome {
        collector::collect(&*self.broker, &handle.task_ids, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OriginKind;
    use crate::provider::llm::GeneratedQAPair;
    use async_trait::async_trait;

    struct ImmediateProvider;

    #[async_trait]
    impl LlmProvider for ImmediateProvider {
        fn tag(&self) -> &'static str {
            "immediate"
        }

        async fn generate_structured(
            &self,
            _prompt: &str,
            _model_hint: Option<&str>,
        ) -> Result<crate::provider::GeneratedQASet> {
            Ok(crate::provider::GeneratedQASet {
                qa_pairs: vec![GeneratedQAPair {
                    question: "Q?".to_string(),
                    answer: "A.".to_string(),
                    question_type: crate::core::QuestionType::Fact,
                }],
            })
        }

        async fn generate_text(&self, _prompt: &str, _model_hint: Option<&str>) -> Result<String> {
            Ok(String::new())
        }
    }

    fn chunk(index: usize) -> Chunk {
        Chunk::new("doc-1", 0, index, "some text", 10, OriginKind::Paragraph, vec![])
    }

    #[tokio::test]
    async fn test_submit_rejects_mismatched_lengths() {
        let dispatcher = TaskDispatcher::new(
            Arc::new(InProcessBroker::new()),
            Arc::new(ImmediateProvider),
            DispatcherConfig::default(),
        );
        let result = dispatcher.submit(&[chunk(0), chunk(1)], &[1], "demo").await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_submit_then_collect_round_trip() {
        let dispatcher = TaskDispatcher::new(
            Arc::new(InProcessBroker::new()),
            Arc::new(ImmediateProvider),
            DispatcherConfig {
                worker_count: 2,
                batch_size: 1,
                model_hint: None,
                jitter_enabled: false,
            },
        );

        let chunks = vec![chunk(0), chunk(1), chunk(2)];
        let handle = dispatcher.submit(&chunks, &[1, 1, 1], "demo").await.unwrap();
        let outcome = dispatcher.collect(handle, Duration::from_secs(5)).await;

        assert_eq!(outcome.diagnostics.success, 3);
        assert_eq!(outcome.diagnostics.failure, 0);
        assert_eq!(outcome.pairs.len(), 3);
    }
}
