//! Stored row types for the creator/link graph.
//!
//! A creator is created on the first successful channel resolution that
//! yields a display name. Links may exist before their creator: a handle
//! accepted for processing is inserted as a placeholder row with
//! `creator_id = NULL` and backfilled once asynchronous enrichment resolves
//! the owning channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance tag written on rows discovered through the YouTube pipeline.
pub const SOURCE_PLATFORM: &str = "YouTube";

/// A resolved content creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
  pub id:            i64,
  /// Display name; treated as a natural key (UNIQUE in the schema).
  pub name:          String,
  pub discovered_on: String,
  pub first_seen:    DateTime<Utc>,
}

/// A single cross-platform link, optionally owned by a creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
  pub id:            i64,
  /// `None` while the row is a placeholder awaiting enrichment.
  pub creator_id:    Option<i64>,
  /// Label derived from the link's hostname via the domain ledger.
  pub platform:      String,
  /// The original input string, when the link came from a submitted handle.
  pub handle:        Option<String>,
  /// Canonical URL; globally unique.
  pub link:          String,
  /// The platform tag or originating link that led to discovery.
  pub discovered_on: String,
  pub first_seen:    DateTime<Utc>,
}

/// One search result row: a creator joined with one of its links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorHit {
  pub name:     String,
  pub platform: String,
  pub handle:   Option<String>,
  pub link:     String,
}

/// A link as shown in grouped listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRef {
  pub platform: String,
  pub handle:   Option<String>,
  pub link:     String,
}

/// A creator with all of its known links, for the subscriptions view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorWithLinks {
  pub name:  String,
  pub links: Vec<LinkRef>,
}
