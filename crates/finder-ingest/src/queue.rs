//! The deferred-enrichment queue and its retry/backoff consumer.
//!
//! An in-process, mutex-guarded deque stands in for a hosted message queue:
//! entries carry a delivery-attempt count and an earliest-due instant. The
//! consumer drains a bounded batch per tick and reacts per message:
//!
//! - success → creator resolved/created, placeholder backfilled, secondary
//!   links inserted, message acked (removed);
//! - quota signal → the whole remaining batch is re-queued with a delay
//!   from the per-attempt schedule — quota exhaustion affects all pending
//!   work equally, so this is a global circuit-breaker, not per-message;
//! - invalid link / channel not found → logged and dropped;
//! - anything else → that message alone is re-queued (at-least-once), up to
//!   a delivery ceiling.

use std::{
  collections::VecDeque,
  sync::Arc,
  time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, error, info, warn};

use finder_core::store::CreatorStore;

use crate::source::{ChannelSource, FetchError};

/// Delay applied when the attempt count runs off the end of the schedule.
pub const FALLBACK_DELAY: Duration = Duration::from_secs(12 * 60 * 60);

// ─── Job & queue ─────────────────────────────────────────────────────────────

/// A unit of deferred enrichment work, referencing a previously-inserted
/// placeholder link row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentJob {
  /// Canonical channel URL to resolve.
  pub link:    String,
  /// The original submitted input, kept as the creator-name fallback.
  pub handle:  String,
  /// Id of the placeholder `links` row to backfill.
  pub link_id: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct QueueEntry {
  pub(crate) job:        EnrichmentJob,
  pub(crate) attempts:   u32,
  pub(crate) not_before: Option<Instant>,
}

impl QueueEntry {
  fn due(&self, now: Instant) -> bool {
    self.not_before.is_none_or(|at| at <= now)
  }
}

/// Shared handle to the enrichment queue. Cloning is cheap.
#[derive(Clone, Default)]
pub struct JobQueue {
  inner: Arc<Mutex<VecDeque<QueueEntry>>>,
}

impl JobQueue {
  pub fn new() -> Self {
    Self::default()
  }

  /// Enqueue a fresh job for immediate delivery.
  pub async fn enqueue(&self, job: EnrichmentJob) {
    let mut queue = self.inner.lock().await;
    queue.push_back(QueueEntry { job, attempts: 0, not_before: None });
  }

  pub async fn len(&self) -> usize {
    self.inner.lock().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.inner.lock().await.is_empty()
  }

  /// Take up to `max` entries whose due time has passed, preserving order.
  pub(crate) async fn take_due(&self, max: usize) -> Vec<QueueEntry> {
    let mut queue = self.inner.lock().await;
    let now = Instant::now();

    let mut batch = Vec::new();
    let mut remaining = VecDeque::with_capacity(queue.len());
    while let Some(entry) = queue.pop_front() {
      if batch.len() < max && entry.due(now) {
        batch.push(entry);
      } else {
        remaining.push_back(entry);
      }
    }
    *queue = remaining;

    batch
  }

  /// Put an entry back with an incremented attempt count and a delay.
  pub(crate) async fn requeue(&self, mut entry: QueueEntry, delay: Duration) {
    entry.attempts += 1;
    entry.not_before = Some(Instant::now() + delay);
    self.inner.lock().await.push_back(entry);
  }

  #[cfg(test)]
  pub(crate) async fn entries(&self) -> Vec<QueueEntry> {
    self.inner.lock().await.iter().cloned().collect()
  }
}

// ─── Consumer ────────────────────────────────────────────────────────────────

/// Tuning for the queue consumer.
#[derive(Debug, Clone)]
pub struct QueueConfig {
  /// Backoff schedule in seconds, indexed by delivery-attempt count;
  /// attempts past the end fall back to [`FALLBACK_DELAY`].
  pub delays:        Vec<Duration>,
  /// Messages drained per tick.
  pub batch_size:    usize,
  /// Ceiling on per-message redeliveries after transient failures. A quota
  /// delay requeues without dropping, so it can never fail a message by
  /// itself.
  pub max_attempts:  u32,
  /// Idle sleep between polls when no work is due.
  pub poll_interval: Duration,
}

impl Default for QueueConfig {
  fn default() -> Self {
    Self {
      delays:        vec![
        Duration::from_secs(60),
        Duration::from_secs(600),
        Duration::from_secs(3600),
      ],
      batch_size:    10,
      max_attempts:  8,
      poll_interval: Duration::from_secs(10),
    }
  }
}

impl QueueConfig {
  fn delay_for(&self, attempts: u32) -> Duration {
    self
      .delays
      .get(attempts as usize)
      .copied()
      .unwrap_or(FALLBACK_DELAY)
  }
}

/// How the consumer must react to a failed message.
enum Disposition {
  /// Unrecoverable for this message; log and forget.
  Drop(String),
  /// Transient for this message; redeliver it alone.
  Retry(String),
  /// Quota exhaustion; redeliver the whole in-flight batch later.
  DelayBatch(String),
}

/// Drains [`EnrichmentJob`]s and writes their results into the store.
pub struct QueueConsumer<S, C> {
  queue:  JobQueue,
  store:  Arc<S>,
  source: Arc<C>,
  config: QueueConfig,
}

impl<S, C> QueueConsumer<S, C>
where
  S: CreatorStore,
  C: ChannelSource,
{
  pub fn new(
    queue: JobQueue,
    store: Arc<S>,
    source: Arc<C>,
    config: QueueConfig,
  ) -> Self {
    Self { queue, store, source, config }
  }

  /// Run forever, polling for due work.
  pub async fn run(&self) {
    info!("queue consumer started");
    loop {
      let taken = self.tick().await;
      if taken == 0 {
        tokio::time::sleep(self.config.poll_interval).await;
      }
    }
  }

  /// Drain and process one batch of due jobs. Returns how many were taken.
  pub async fn tick(&self) -> usize {
    let batch = self.queue.take_due(self.config.batch_size).await;
    let taken = batch.len();

    let mut pending = batch.into_iter();
    while let Some(entry) = pending.next() {
      let link = entry.job.link.clone();
      match self.process_one(&entry.job).await {
        Ok(()) => debug!(link = %link, "enrichment job acked"),
        Err(Disposition::Drop(reason)) => {
          warn!(link = %link, reason = %reason, "enrichment job dropped");
        }
        Err(Disposition::Retry(reason)) => {
          if entry.attempts + 1 >= self.config.max_attempts {
            error!(
              link = %link,
              attempts = entry.attempts + 1,
              reason = %reason,
              "enrichment job exceeded delivery ceiling, dropping"
            );
            continue;
          }
          warn!(link = %link, reason = %reason, "enrichment job will retry");
          let delay = self.config.delay_for(entry.attempts);
          self.queue.requeue(entry, delay).await;
        }
        Err(Disposition::DelayBatch(reason)) => {
          // Quota exhaustion affects every pending message equally: put the
          // current message and the rest of the batch back, delayed, and
          // abandon this tick.
          error!(reason = %reason, "quota exhausted, delaying whole batch");
          let delay = self.config.delay_for(entry.attempts);
          self.queue.requeue(entry, delay).await;
          for rest in pending {
            let delay = self.config.delay_for(rest.attempts);
            self.queue.requeue(rest, delay).await;
          }
          break;
        }
      }
    }

    taken
  }

  async fn process_one(&self, job: &EnrichmentJob) -> Result<(), Disposition> {
    let profile =
      self
        .source
        .channel_profile(&job.link)
        .await
        .map_err(|e| match e {
          FetchError::Invalid(m) | FetchError::NotFound(m) => Disposition::Drop(m),
          FetchError::Quota(m)    => Disposition::DelayBatch(m),
          FetchError::Upstream(m) => Disposition::Retry(m),
        })?;

    // Fall back to the submitted handle when the upstream display name is
    // unusable.
    let name = if profile.name.trim().is_empty() {
      job.handle.as_str()
    } else {
      profile.name.as_str()
    };

    let creator_id = self
      .store
      .get_or_create_creator(name)
      .await
      .map_err(|e| Disposition::Retry(e.to_string()))?;

    self
      .store
      .set_link_creator(job.link_id, creator_id)
      .await
      .map_err(|e| Disposition::Retry(e.to_string()))?;

    for url in &profile.shared_links {
      // A bad secondary URL is fatal for that link only: log and skip.
      if let Err(e) = self
        .store
        .insert_or_link_url(Some(creator_id), url, None, &job.link)
        .await
      {
        warn!(url = %url, error = %e, "skipping secondary link");
      }
    }

    Ok(())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use finder_core::store::CreatorStore as _;
  use finder_store_sqlite::SqliteStore;

  use super::*;
  use crate::source::ChannelProfile;

  /// Scripted outcomes per link, for driving consumer dispositions.
  #[derive(Clone)]
  enum StubOutcome {
    Profile(&'static str, Vec<&'static str>),
    Quota,
    NotFound,
    Upstream,
  }

  struct StubSource {
    outcomes: HashMap<String, StubOutcome>,
  }

  impl StubSource {
    fn new(outcomes: impl IntoIterator<Item = (&'static str, StubOutcome)>) -> Self {
      Self {
        outcomes: outcomes
          .into_iter()
          .map(|(k, v)| (k.to_string(), v))
          .collect(),
      }
    }
  }

  impl ChannelSource for StubSource {
    async fn channel_profile(&self, link: &str) -> Result<ChannelProfile, FetchError> {
      match self.outcomes.get(link) {
        Some(StubOutcome::Profile(name, links)) => Ok(ChannelProfile {
          name:         (*name).to_string(),
          shared_links: links.iter().map(|s| (*s).to_string()).collect(),
        }),
        Some(StubOutcome::Quota)    => Err(FetchError::Quota("quotaExceeded".into())),
        Some(StubOutcome::NotFound) => Err(FetchError::NotFound(link.to_string())),
        Some(StubOutcome::Upstream) | None => {
          Err(FetchError::Upstream("backend error".into()))
        }
      }
    }
  }

  async fn consumer_with(
    outcomes: impl IntoIterator<Item = (&'static str, StubOutcome)>,
    config: QueueConfig,
  ) -> (QueueConsumer<SqliteStore, StubSource>, JobQueue, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.expect("store"));
    let queue = JobQueue::new();
    let consumer = QueueConsumer::new(
      queue.clone(),
      store.clone(),
      Arc::new(StubSource::new(outcomes)),
      config,
    );
    (consumer, queue, store)
  }

  /// Insert a placeholder row and enqueue the matching job.
  async fn submit(store: &SqliteStore, queue: &JobQueue, link: &str, handle: &str) -> i64 {
    let link_id = store
      .insert_or_link_url(None, link, Some(handle), "YouTube")
      .await
      .unwrap();
    queue
      .enqueue(EnrichmentJob {
        link:   link.to_string(),
        handle: handle.to_string(),
        link_id,
      })
      .await;
    link_id
  }

  #[tokio::test]
  async fn successful_job_backfills_creator_and_inserts_secondary_links() {
    let link = "https://www.youtube.com/@alice";
    let (consumer, queue, store) = consumer_with(
      [(
        link,
        StubOutcome::Profile(
          "Alice",
          vec!["https://www.patreon.com/alice", "https://twitch.tv/alice"],
        ),
      )],
      QueueConfig::default(),
    )
    .await;

    let link_id = submit(&store, &queue, link, "@alice").await;
    assert_eq!(consumer.tick().await, 1);
    assert!(queue.is_empty().await);

    // Placeholder backfilled.
    let row = store.get_link(link_id).await.unwrap().unwrap();
    let creator_id = row.creator_id.expect("backfilled creator");
    let creator = store.get_creator(creator_id).await.unwrap().unwrap();
    assert_eq!(creator.name, "Alice");

    // Secondary links attributed to the creator, discovered via the
    // originating link.
    let patreon_id = store
      .find_link_by_url("https://www.patreon.com/alice")
      .await
      .unwrap()
      .expect("secondary link inserted");
    let patreon = store.get_link(patreon_id).await.unwrap().unwrap();
    assert_eq!(patreon.creator_id, Some(creator_id));
    assert_eq!(patreon.discovered_on, link);
    assert_eq!(patreon.platform, "patreon");
  }

  #[tokio::test]
  async fn blank_display_name_falls_back_to_handle() {
    let link = "https://www.youtube.com/@ghost";
    let (consumer, queue, store) =
      consumer_with([(link, StubOutcome::Profile("  ", vec![]))], QueueConfig::default())
        .await;

    let link_id = submit(&store, &queue, link, "@ghost").await;
    consumer.tick().await;

    let row = store.get_link(link_id).await.unwrap().unwrap();
    let creator = store
      .get_creator(row.creator_id.unwrap())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(creator.name, "@ghost");
  }

  #[tokio::test]
  async fn quota_signal_delays_the_whole_remaining_batch() {
    let config = QueueConfig {
      delays: vec![Duration::from_secs(300)],
      batch_size: 5,
      ..QueueConfig::default()
    };
    let (consumer, queue, store) = consumer_with(
      [
        ("https://www.youtube.com/@ok", StubOutcome::Profile("Ok", vec![])),
        ("https://www.youtube.com/@quota", StubOutcome::Quota),
      ],
      config,
    )
    .await;

    // Five messages; the first succeeds, the second hits quota.
    submit(&store, &queue, "https://www.youtube.com/@ok", "@ok").await;
    submit(&store, &queue, "https://www.youtube.com/@quota", "@quota").await;
    for n in 3..=5 {
      submit(&store, &queue, &format!("https://www.youtube.com/@c{n}"), "@c").await;
    }

    assert_eq!(consumer.tick().await, 5);

    // Message 1 acked; messages 2–5 rescheduled, none permanently failed.
    let entries = queue.entries().await;
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.attempts == 1));
    assert!(entries.iter().all(|e| e.not_before.is_some()));
    assert_eq!(entries[0].job.link, "https://www.youtube.com/@quota");
  }

  #[tokio::test]
  async fn delayed_batch_is_not_due_until_its_backoff_elapses() {
    let config = QueueConfig {
      delays: vec![Duration::from_secs(300)],
      ..QueueConfig::default()
    };
    let (consumer, queue, store) = consumer_with(
      [("https://www.youtube.com/@quota", StubOutcome::Quota)],
      config,
    )
    .await;

    submit(&store, &queue, "https://www.youtube.com/@quota", "@quota").await;
    consumer.tick().await;

    // Still queued, but not due: the next tick takes nothing.
    assert_eq!(queue.len().await, 1);
    assert_eq!(consumer.tick().await, 0);
  }

  #[tokio::test]
  async fn not_found_is_dropped_without_retry() {
    let link = "https://www.youtube.com/@missing";
    let (consumer, queue, store) =
      consumer_with([(link, StubOutcome::NotFound)], QueueConfig::default()).await;

    let link_id = submit(&store, &queue, link, "@missing").await;
    consumer.tick().await;

    assert!(queue.is_empty().await);
    // The placeholder row stays un-enriched.
    let row = store.get_link(link_id).await.unwrap().unwrap();
    assert_eq!(row.creator_id, None);
  }

  #[tokio::test]
  async fn upstream_failure_retries_only_that_message() {
    let config = QueueConfig {
      delays: vec![Duration::ZERO],
      ..QueueConfig::default()
    };
    let (consumer, queue, store) = consumer_with(
      [
        ("https://www.youtube.com/@flaky", StubOutcome::Upstream),
        ("https://www.youtube.com/@fine", StubOutcome::Profile("Fine", vec![])),
      ],
      config,
    )
    .await;

    submit(&store, &queue, "https://www.youtube.com/@flaky", "@flaky").await;
    let fine_id = submit(&store, &queue, "https://www.youtube.com/@fine", "@fine").await;

    assert_eq!(consumer.tick().await, 2);

    // The healthy sibling completed despite the failure before it.
    let fine = store.get_link(fine_id).await.unwrap().unwrap();
    assert!(fine.creator_id.is_some());

    // Only the flaky message is back, with one more attempt on the clock.
    let entries = queue.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].job.link, "https://www.youtube.com/@flaky");
    assert_eq!(entries[0].attempts, 1);
  }

  #[tokio::test]
  async fn delivery_ceiling_drops_perpetually_failing_messages() {
    let config = QueueConfig {
      delays: vec![Duration::ZERO],
      max_attempts: 2,
      ..QueueConfig::default()
    };
    let (consumer, queue, store) = consumer_with(
      [("https://www.youtube.com/@flaky", StubOutcome::Upstream)],
      config,
    )
    .await;

    submit(&store, &queue, "https://www.youtube.com/@flaky", "@flaky").await;

    consumer.tick().await; // attempt 1, requeued with zero delay
    assert_eq!(queue.len().await, 1);
    consumer.tick().await; // attempt 2 would exceed the ceiling
    assert!(queue.is_empty().await);
  }
}
