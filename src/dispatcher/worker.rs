//! Per-worker task execution: claim, synthesize, retry, write terminal
//! result.

use std::time::Duration;

use rand::Rng;

use crate::core::{Chunk, QAPair, Task, TaskResult, TaskStatus};
use crate::dispatcher::broker::Broker;
use crate::error::{Error, ProviderError};
use crate::provider::llm::{build_batch_prompt, build_single_prompt, GeneratedQAPair, LlmProvider};

/// Upper bound on a single LLM call's duration before it counts as a
/// retryable transient failure.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Pre-call jitter bounds, applied once per batch round when enabled.
const JITTER_MIN_MS: u64 = 500;
const JITTER_MAX_MS: u64 = 1_500;

/// Runs one worker's claim-process-write loop until the queue is drained.
///
/// Exits once a `claim_batch` call returns no tasks — there is no more work
/// for this worker, though other workers may still be retrying tasks that
/// get requeued after this worker has already stopped.
pub async fn run_worker_loop(
    broker: &dyn Broker,
    llm: &dyn LlmProvider,
    provider_tag: &str,
    dataset_tag: &str,
    batch_size: usize,
    model_hint: Option<&str>,
    jitter_enabled: bool,
) {
    loop {
        let Ok(mut batch) = broker.claim_batch(batch_size.max(1)).await else {
            return;
        };
        if batch.is_empty() {
            return;
        }

        run_batch(&mut batch, llm, provider_tag, dataset_tag, model_hint, jitter_enabled).await;

        for task in &batch {
            if !task.status.is_terminal() {
                let delay = backoff_delay(task.attempt_count);
                tokio::time::sleep(delay).await;
            }
            if broker.write_result(task).await.is_err() {
                return;
            }
        }
    }
}

/// Executes one attempt round for every task in `batch`, distributing any
/// pairs the provider returns per the batching distribution rule (pairs
/// assigned in order, surplus discarded, deficit tolerated).
async fn run_batch(
    batch: &mut [Task],
    llm: &dyn LlmProvider,
    provider_tag: &str,
    dataset_tag: &str,
    model_hint: Option<&str>,
    jitter_enabled: bool,
) {
    for task in batch.iter_mut() {
        task.status = TaskStatus::Running;
        task.attempt_count = task.attempt_count.saturating_add(1);
    }

    if jitter_enabled {
        pre_call_jitter().await;
    }

    let counts: Vec<(&str, usize)> = batch
        .iter()
        .map(|t| (t.chunk.text.as_str(), t.requested_count))
        .collect();

    let generated = synthesize_batch(llm, &counts, model_hint).await;

    let shares: Vec<Vec<GeneratedQAPair>> = match generated {
        Ok(pairs) => distribute_batch(pairs, &batch.iter().map(|t| t.requested_count).collect::<Vec<_>>()),
        Err(_) => batch.iter().map(|_| Vec::new()).collect(),
    };

    for (task, share) in batch.iter_mut().zip(shares) {
        if share.is_empty() {
            if !task.has_attempts_remaining() {
                task.status = TaskStatus::Failure;
                task.result = Some(TaskResult::Error(
                    "exhausted retry attempts without producing any Q/A pair".to_string(),
                ));
            } else {
                task.status = TaskStatus::Pending;
            }
            continue;
        }

        let pairs = stamp_pairs(share, &task.chunk, dataset_tag, provider_tag);
        task.status = TaskStatus::Success;
        task.result = Some(TaskResult::Pairs(pairs));
    }
}

/// Calls the provider once for the whole batch, falling back from
/// structured generation to text-plus-extraction on schema or parser
/// failure, per the output-handling contract.
async fn synthesize_batch(
    llm: &dyn LlmProvider,
    counts: &[(&str, usize)],
    model_hint: Option<&str>,
) -> crate::error::Result<Vec<GeneratedQAPair>> {
    let prompt = if counts.len() == 1 {
        build_single_prompt(counts[0].0, counts[0].1)
    } else {
        build_batch_prompt(counts)
    };

    let structured = with_call_timeout(llm.generate_structured(&prompt, model_hint)).await;
    if let Ok(set) = structured {
        if !set.qa_pairs.is_empty() {
            return Ok(set.qa_pairs);
        }
    }

    let text = with_call_timeout(llm.generate_text(&prompt, model_hint))
        .await
        .map_err(|_| Error::from(ProviderError::EmptyOutput))?;
    let set = crate::provider::llm::extract_qa_set(&text)?;
    if set.qa_pairs.is_empty() {
        return Err(ProviderError::EmptyOutput.into());
    }
    Ok(set.qa_pairs)
}

async fn with_call_timeout<T>(
    fut: impl std::future::Future<Output = crate::error::Result<T>>,
) -> crate::error::Result<T> {
    match tokio::time::timeout(CALL_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            secs: CALL_TIMEOUT.as_secs(),
        }
        .into()),
    }
}

/// Assigns generated pairs to chunks in order, each chunk consuming its
/// requested count; surplus pairs are discarded, deficits are tolerated.
fn distribute_batch(pairs: Vec<GeneratedQAPair>, requested_counts: &[usize]) -> Vec<Vec<GeneratedQAPair>> {
    let mut iter = pairs.into_iter();
    requested_counts
        .iter()
        .map(|&n| iter.by_ref().take(n).collect())
        .collect()
}

/// Stamps generated pairs with the source chunk's identifying fields.
fn stamp_pairs(
    generated: Vec<GeneratedQAPair>,
    chunk: &Chunk,
    dataset_tag: &str,
    provider_tag: &str,
) -> Vec<QAPair> {
    generated
        .into_iter()
        .map(|g| QAPair {
            question: g.question,
            answer: g.answer,
            question_type: g.question_type,
            source_chunk_id: chunk.chunk_id.clone(),
            doc_id: chunk.doc_id.clone(),
            dataset_tag: dataset_tag.to_string(),
            chunk_index: chunk.chunk_index,
            provider_tag: Some(provider_tag.to_string()),
        })
        .collect()
}

async fn pre_call_jitter() {
    let millis = rand::thread_rng().gen_range(JITTER_MIN_MS..=JITTER_MAX_MS);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

fn backoff_delay(attempt_count: u8) -> Duration {
    Duration::from_millis(100u64 << attempt_count.min(6))
}
