//! Two-phase result collection: poll for terminal state, then read every
//! terminal record directly from the result store by id.

use std::time::{Duration, Instant};

use crate::core::{QAPair, TaskResult, TaskStatus};
use crate::dispatcher::broker::Broker;

/// Shortest allowed collector timeout (see §6's configuration clamp).
pub const MIN_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Longest allowed collector timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Clamps a *default* collector timeout into the sensible interval this
/// system suggests for large runs. This is applied by the CLI layer to its
/// own configured default; a timeout passed explicitly to [`collect`] (e.g.
/// a short timeout under test) is honored as given, since the caller has
/// already made a deliberate choice.
#[must_use]
pub fn clamp_timeout(requested: Duration) -> Duration {
    requested.clamp(MIN_TIMEOUT, MAX_TIMEOUT)
}

/// Per-chunk diagnostic counts from one collect call.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Tasks that reached `success`.
    pub success: usize,
    /// Tasks that reached `failure` (retry budget exhausted).
    pub failure: usize,
    /// Tasks that never reached a terminal state, or whose record could not
    /// be decoded — counted separately from `failure` per §4.6.
    pub error: usize,
    /// `(chunk_id, error message)` for each failed task.
    pub failed_chunks: Vec<(String, String)>,
}

/// Aggregated output of a collect call.
#[derive(Debug, Clone, Default)]
pub struct CollectOutcome {
    /// All pairs collected from successful tasks, sorted by
    /// `(doc_id, chunk_index)` for deterministic output.
    pub pairs: Vec<QAPair>,
    /// Success/failure/error counts and failure attribution.
    pub diagnostics: Diagnostics,
}

/// Waits for every task in `task_ids` to reach a terminal state (or for
/// `timeout` to expire), printing periodic progress lines, then drains the
/// result store independently of any in-memory task handles.
pub async fn collect(broker: &dyn Broker, task_ids: &[String], timeout: Duration) -> CollectOutcome {
    wait_phase(broker, task_ids, timeout).await;
    drain_phase(broker, task_ids).await
}

async fn wait_phase(broker: &dyn Broker, task_ids: &[String], timeout: Duration) {
    let deadline = Instant::now() + timeout;
    let mut last_progress = Instant::now() - PROGRESS_INTERVAL;

    loop {
        let mut terminal = 0usize;
        for id in task_ids {
            if matches!(broker.read_result(id).await, Ok(Some(task)) if task.status.is_terminal()) {
                terminal += 1;
            }
        }

        let all_done = terminal >= task_ids.len();
        let timed_out = Instant::now() >= deadline;

        if all_done || timed_out || last_progress.elapsed() >= PROGRESS_INTERVAL {
            println!("progress: completed={terminal}/{}", task_ids.len());
            last_progress = Instant::now();
        }

        if all_done || timed_out {
            return;
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn drain_phase(broker: &dyn Broker, task_ids: &[String]) -> CollectOutcome {
    let mut diagnostics = Diagnostics::default();
    let mut pairs = Vec::new();

    for id in task_ids {
        match broker.read_result(id).await {
            Ok(Some(task)) if task.status == TaskStatus::Success => {
                diagnostics.success += 1;
                if let Some(TaskResult::Pairs(task_pairs)) = task.result {
                    pairs.extend(task_pairs);
                }
            }
            Ok(Some(task)) if task.status == TaskStatus::Failure => {
                diagnostics.failure += 1;
                let message = match task.result {
                    Some(TaskResult::Error(message)) => message,
                    _ => "task failed without an error message".to_string(),
                };
                diagnostics.failed_chunks.push((task.chunk.chunk_id.clone(), message));
            }
            Ok(Some(_)) | Ok(None) | Err(_) => {
                diagnostics.error += 1;
            }
        }
    }

    pairs.sort_by(|a, b| a.doc_id.cmp(&b.doc_id).then(a.chunk_index.cmp(&b.chunk_index)));

    CollectOutcome { pairs, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Chunk, OriginKind, Task};
    use crate::dispatcher::broker::InProcessBroker;

    fn success_task(id: &str, doc_id: &str, chunk_index: usize) -> Task {
        let chunk = Chunk::new(doc_id, 0, chunk_index, "text", 10, OriginKind::Paragraph, vec![]);
        let mut task = Task::new(id, chunk.clone(), 1);
        task.status = TaskStatus::Success;
        task.result = Some(TaskResult::Pairs(vec![QAPair {
            question: "Q?".to_string(),
            answer: "A.".to_string(),
            question_type: crate::core::QuestionType::Fact,
            source_chunk_id: chunk.chunk_id.clone(),
            doc_id: chunk.doc_id.clone(),
            dataset_tag: "demo".to_string(),
            chunk_index,
            provider_tag: None,
        }]));
        task
    }

    #[test]
    fn test_clamp_timeout_enforces_floor() {
        assert_eq!(clamp_timeout(Duration::from_secs(1)), MIN_TIMEOUT);
    }

    #[test]
    fn test_clamp_timeout_enforces_ceiling() {
        assert_eq!(clamp_timeout(Duration::from_secs(u64::from(u32::MAX))), MAX_TIMEOUT);
    }

    #[tokio::test]
    async fn test_drain_phase_counts_success_and_failure() {
        let broker = InProcessBroker::new();
        broker.write_result(&success_task("t-1", "doc-1", 0)).await.unwrap();

        let mut failed = Task::new("t-2", Chunk::new("doc-1", 0, 1, "x", 10, OriginKind::Paragraph, vec![]), 1);
        failed.status = TaskStatus::Failure;
        failed.result = Some(TaskResult::Error("no pairs".to_string()));
        broker.write_result(&failed).await.unwrap();

        let outcome = drain_phase(&broker, &["t-1".to_string(), "t-2".to_string()]).await;
        assert_eq!(outcome.diagnostics.success, 1);
        assert_eq!(outcome.diagnostics.failure, 1);
        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.diagnostics.failed_chunks[0].1, "no pairs");
    }

    #[tokio::test]
    async fn test_drain_phase_counts_missing_as_error() {
        let broker = InProcessBroker::new();
        let outcome = drain_phase(&broker, &["ghost".to_string()]).await;
        assert_eq!(outcome.diagnostics.error, 1);
    }

    #[tokio::test]
    async fn test_pairs_sorted_by_doc_and_chunk_index() {
        let broker = InProcessBroker::new();
        broker.write_result(&success_task("t-1", "doc-2", 0)).await.unwrap();
        broker.write_result(&success_task("t-2", "doc-1", 1)).await.unwrap();
        broker.write_result(&success_task("t-3", "doc-1", 0)).await.unwrap();

        let outcome = drain_phase(&broker, &["t-1".to_string(), "t-2".to_string(), "t-3".to_string()]).await;
        assert_eq!(outcome.pairs[0].doc_id, "doc-1");
        assert_eq!(outcome.pairs[0].chunk_index, 0);
        assert_eq!(outcome.pairs[2].doc_id, "doc-2");
    }

    #[tokio::test]
    async fn test_wait_phase_returns_after_timeout_with_pending_tasks() {
        let broker = InProcessBroker::new();
        broker.write_result(&success_task("t-1", "doc-1", 0)).await.unwrap();
        let pending_task = Task::new(
            "t-2",
            Chunk::new("doc-1", 0, 1, "x", 10, OriginKind::Paragraph, vec![]),
            1,
        );
        broker.enqueue(pending_task).await.unwrap();

        wait_phase(&broker, &["t-1".to_string(), "t-2".to_string()], Duration::from_millis(1)).await;

        let outcome = drain_phase(&broker, &["t-1".to_string(), "t-2".to_string()]).await;
        assert_eq!(outcome.diagnostics.success, 1);
        assert_eq!(outcome.diagnostics.error, 1);
    }
}
