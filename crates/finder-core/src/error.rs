//! Error types for `finder-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The submitted handle/URL matches none of the recognised shapes, or
  /// points at a domain other than the source platform.
  #[error("invalid identifier {input:?}: {reason}")]
  InvalidIdentifier { input: String, reason: String },

  /// A link that cannot be parsed as a URL or has no hostname.
  #[error("unparseable link: {0:?}")]
  InvalidUrl(String),
}

impl Error {
  pub(crate) fn invalid(input: &str, reason: impl Into<String>) -> Self {
    Error::InvalidIdentifier {
      input:  input.to_string(),
      reason: reason.into(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
