//! Ingestion orchestration and the deferred-enrichment queue.
//!
//! The request path only normalises input, inserts a placeholder link row
//! and enqueues an [`EnrichmentJob`]; the network-bound channel resolution
//! runs later in the [`QueueConsumer`], which backfills the placeholder and
//! fans extracted secondary links out into the store.

pub mod orchestrator;
pub mod queue;
pub mod source;

pub use orchestrator::{IngestReport, ingest_handles};
pub use queue::{EnrichmentJob, JobQueue, QueueConfig, QueueConsumer};
pub use source::{ChannelProfile, ChannelSource, FetchError, YoutubeSource};
