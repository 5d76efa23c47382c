//! Error type for `finder-youtube`, including quota classification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The upstream has no matching channel, after the search fallback.
  #[error("channel not found: {0:?}")]
  ChannelNotFound(String),

  /// The upstream signalled quota or rate-limit exhaustion. Consumers react
  /// with a batch-wide delay, never a permanent failure.
  #[error("upstream quota exhausted: {0}")]
  QuotaExceeded(String),

  /// Any other upstream API failure.
  #[error("upstream API error ({status}): {message}")]
  Api { status: u16, message: String },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Whether an upstream failure is a quota/rate-limit signal.
///
/// Prefers the structured `error.errors[].reason` field; the message
/// substring check is a fallback heuristic for payloads without one, kept
/// behind this one predicate so it stays swappable.
pub fn quota_signalled(reason: Option<&str>, message: &str) -> bool {
  const QUOTA_REASONS: [&str; 4] = [
    "quotaExceeded",
    "rateLimitExceeded",
    "dailyLimitExceeded",
    "userRateLimitExceeded",
  ];
  if let Some(reason) = reason {
    return QUOTA_REASONS.contains(&reason);
  }
  let lower = message.to_ascii_lowercase();
  lower.contains("quota") || lower.contains("exceeded")
}
