//! Chunked submission of bulk mutations.
//!
//! The API accepts at most 100 items per create/update call. Larger inputs
//! are partitioned and submitted sequentially in order; per-item results
//! are folded into one aggregate. Partial failure is an expected outcome
//! reported to the caller, never an error.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::http::Requester;

/// Hard per-request item limit of the remote API
pub const MAX_CHUNK_SIZE: usize = 100;

/// Aggregate result of one logical batch call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} successful", self.success, self.total)
    }
}

/// Per-item status entry in a mutation response
#[derive(Debug, Clone, Deserialize)]
pub struct MutationResult {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(
        default,
        alias = "keywordId",
        alias = "campaignId",
        alias = "adGroupId"
    )]
    pub entity_id: Option<u64>,
}

impl MutationResult {
    pub fn is_success(&self) -> bool {
        self.code.as_deref() == Some("SUCCESS")
    }
}

/// Submit `items` in chunks of at most [`MAX_CHUNK_SIZE`], preserving
/// order, and fold the per-item statuses into a [`BatchOutcome`]. Returns
/// the ids of successfully created/updated entities alongside the
/// aggregate.
pub(crate) async fn submit_chunks<T: Serialize>(
    requester: &Requester,
    method: Method,
    path: &str,
    items: &[T],
) -> (BatchOutcome, Vec<u64>) {
    let mut outcome = BatchOutcome {
        total: items.len(),
        ..Default::default()
    };
    let mut entity_ids = Vec::new();

    if items.is_empty() {
        return (outcome, entity_ids);
    }

    let chunk_count = items.len().div_ceil(MAX_CHUNK_SIZE);
    for (index, chunk) in items.chunks(MAX_CHUNK_SIZE).enumerate() {
        match requester.send_json(method.clone(), path, &chunk).await {
            Ok(response) => match response.json::<Vec<MutationResult>>().await {
                Ok(results) => {
                    fold_results(chunk.len(), results, &mut outcome, &mut entity_ids);
                    info!(
                        "Batch chunk {}/{} applied ({} items)",
                        index + 1,
                        chunk_count,
                        chunk.len()
                    );
                }
                Err(err) => {
                    warn!("Unreadable batch response for chunk {}: {}", index + 1, err);
                    outcome.failed += chunk.len();
                }
            },
            Err(err) => {
                error!("Batch chunk {}/{} failed: {}", index + 1, chunk_count, err);
                outcome.failed += chunk.len();
            }
        }
    }

    info!("Batch complete: {}", outcome);
    (outcome, entity_ids)
}

/// Count per-item statuses. Responses shorter than the submitted chunk
/// count the missing tail as failed so `success + failed == total` always
/// holds.
fn fold_results(
    chunk_len: usize,
    results: Vec<MutationResult>,
    outcome: &mut BatchOutcome,
    entity_ids: &mut Vec<u64>,
) {
    let mut seen = 0;
    for result in results.into_iter().take(chunk_len) {
        seen += 1;
        if result.is_success() {
            outcome.success += 1;
            if let Some(id) = result.entity_id {
                entity_ids.push(id);
            }
        } else {
            outcome.failed += 1;
            warn!(
                "Mutation failed for entity {:?}: {}",
                result.entity_id,
                result.details.as_deref().unwrap_or("no details")
            );
        }
    }
    outcome.failed += chunk_len - seen;
}
