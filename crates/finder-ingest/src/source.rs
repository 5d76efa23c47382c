//! The channel-source seam: fetch plus extraction behind one trait.
//!
//! The queue consumer depends on [`ChannelSource`], not on the concrete
//! YouTube client, so its retry/backoff behaviour is testable with a stub.

use std::future::Future;

use thiserror::Error;
use tracing::debug;

use finder_core::{extract, resolve::ChannelRef};
use finder_youtube::YoutubeClient;

// ─── Failure modes ───────────────────────────────────────────────────────────

/// Source failures, shaped by how the consumer must react to each.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The job's link is not a valid channel URL. Reported, never retried.
  #[error("invalid link: {0}")]
  Invalid(String),

  /// The upstream has no matching channel. Reported, never retried.
  #[error("channel not found: {0}")]
  NotFound(String),

  /// Quota/rate-limit exhaustion. Delays the whole in-flight batch.
  #[error("quota exhausted: {0}")]
  Quota(String),

  /// Any other upstream failure. Retried per-message.
  #[error("upstream failure: {0}")]
  Upstream(String),
}

impl From<finder_youtube::Error> for FetchError {
  fn from(e: finder_youtube::Error) -> Self {
    use finder_youtube::Error as E;
    match e {
      E::ChannelNotFound(value) => FetchError::NotFound(value),
      E::QuotaExceeded(message) => FetchError::Quota(message),
      E::Api { status, message } => {
        FetchError::Upstream(format!("{status}: {message}"))
      }
      E::Http(e) => FetchError::Upstream(e.to_string()),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A resolved channel profile: display name plus the links that recur
/// across recent video descriptions.
#[derive(Debug, Clone)]
pub struct ChannelProfile {
  pub name:         String,
  pub shared_links: Vec<String>,
}

/// Resolves a canonical channel URL into a [`ChannelProfile`].
pub trait ChannelSource: Send + Sync {
  fn channel_profile<'a>(
    &'a self,
    link: &'a str,
  ) -> impl Future<Output = Result<ChannelProfile, FetchError>> + Send + 'a;
}

// ─── Production source ───────────────────────────────────────────────────────

/// The production source: YouTube channel resolution followed by the
/// bounded cross-description intersection.
#[derive(Clone)]
pub struct YoutubeSource {
  client:    YoutubeClient,
  /// Bound on URL-bearing descriptions folded into the intersection.
  passes:    usize,
  /// Page size for the uploads listing.
  page_size: u32,
}

impl YoutubeSource {
  pub fn new(client: YoutubeClient, passes: usize, page_size: u32) -> Self {
    Self { client, passes, page_size }
  }
}

impl ChannelSource for YoutubeSource {
  async fn channel_profile(&self, link: &str) -> Result<ChannelProfile, FetchError> {
    let re = ChannelRef::from_url(link)
      .map_err(|e| FetchError::Invalid(e.to_string()))?;
    let identity = self.client.resolve_channel(&re).await?;

    // A channel without public videos resolves successfully with an empty
    // link set.
    let Some(playlist) = identity.uploads_playlist else {
      debug!(name = %identity.name, "channel has no uploads playlist");
      return Ok(ChannelProfile { name: identity.name, shared_links: Vec::new() });
    };

    let descriptions = self
      .client
      .recent_uploads(&playlist, self.page_size)
      .await?;
    let links = extract::recurring_links(
      descriptions.iter().map(String::as_str),
      self.passes,
    );

    Ok(ChannelProfile {
      name:         identity.name,
      shared_links: links.into_iter().collect(),
    })
  }
}
