//! The ingestion orchestrator: accept a batch of raw handles, make each one
//! immediately visible as a placeholder link row, and defer enrichment.
//!
//! Handles are processed independently — one malformed entry never aborts
//! its siblings. The batch partially succeeds: touched link ids and
//! per-handle error messages are both collected into the report.

use thiserror::Error;
use tracing::{debug, warn};

use finder_core::{model::SOURCE_PLATFORM, resolve, store::CreatorStore};

use crate::queue::{EnrichmentJob, JobQueue};

/// Why a single handle was rejected.
#[derive(Debug, Error)]
enum IngestError {
  #[error("{0}")]
  Invalid(#[from] finder_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Outcome of one [`ingest_handles`] batch.
#[derive(Debug, Default)]
pub struct IngestReport {
  /// Link ids touched: pre-existing rows plus freshly-inserted placeholders.
  pub link_ids: Vec<i64>,
  /// One message per failed handle.
  pub errors:   Vec<String>,
}

impl IngestReport {
  /// A batch counts as successful when at least one handle went through.
  pub fn success(&self) -> bool {
    !self.link_ids.is_empty()
  }

  pub fn joined_errors(&self) -> String {
    self.errors.join("\n")
  }
}

/// Ingest a batch of raw handle/URL strings.
///
/// Per handle: normalise, skip if the canonical URL is already known,
/// otherwise insert a placeholder row (`creator_id = NULL`) and enqueue an
/// enrichment job. The request path never touches the upstream API.
pub async fn ingest_handles<S>(
  store: &S,
  queue: &JobQueue,
  handles: &[String],
) -> IngestReport
where
  S: CreatorStore,
{
  let mut report = IngestReport::default();

  for handle in handles {
    match ingest_one(store, queue, handle).await {
      Ok(link_id) => report.link_ids.push(link_id),
      Err(e) => {
        warn!(handle = %handle, error = %e, "handle rejected");
        report.errors.push(format!("handle {handle:?}: {e}"));
      }
    }
  }

  report
}

async fn ingest_one<S>(
  store: &S,
  queue: &JobQueue,
  handle: &str,
) -> Result<i64, IngestError>
where
  S: CreatorStore,
{
  let link = resolve::canonical_url(handle)?;

  // Existence check: an optimisation to skip redundant upstream work for
  // known handles. The UNIQUE constraint on links.link stays the source of
  // truth when two submissions race past this check.
  if let Some(link_id) = store
    .find_link_by_url(&link)
    .await
    .map_err(|e| IngestError::Store(Box::new(e)))?
  {
    debug!(link = %link, link_id, "link already known");
    return Ok(link_id);
  }

  let link_id = store
    .insert_or_link_url(None, &link, Some(handle), SOURCE_PLATFORM)
    .await
    .map_err(|e| IngestError::Store(Box::new(e)))?;

  queue
    .enqueue(EnrichmentJob {
      link,
      handle: handle.to_string(),
      link_id,
    })
    .await;

  Ok(link_id)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
