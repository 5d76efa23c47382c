//! Error type for `finder-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] finder_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An upsert reported a conflict but the authoritative read-back found no
  /// row. Fatal for the item, logged and skipped by callers.
  #[error("store inconsistency: {0}")]
  Inconsistency(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
