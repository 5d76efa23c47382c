//! The `CreatorStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `finder-store-sqlite`). Higher layers (`finder-ingest`, `finder-api`)
//! depend on this abstraction, not on any concrete backend.
//!
//! Both write operations are idempotent with respect to the final stored
//! state when called repeatedly with identical arguments; the domain
//! ledger's `quantity` counter is the one deliberate exception — every call
//! legitimately records one more occurrence.

use std::future::Future;

use crate::model::{CreatorHit, CreatorWithLinks};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`CreatorStore::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
  /// Free-text filter applied over creator names, link handles and URLs.
  pub text:         String,
  /// When non-empty, restrict to creators reachable from these link ids
  /// (the caller's subscription scope).
  pub within_links: Vec<i64>,
  pub limit:        usize,
  pub offset:       usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the creator/link graph backend.
///
/// Mutations are expressed as single-statement upserts with conflict
/// clauses, never read-then-write critical sections, so implementations are
/// correct under concurrent writers without cross-statement transactions.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait CreatorStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look a creator up by exact (trimmed) display name, inserting it with
  /// the source-platform provenance tag if absent. Two concurrent calls
  /// with the same new name must converge on one row: the UNIQUE name
  /// constraint plus insert-conflict read-back is the resolution mechanism.
  fn get_or_create_creator<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Upsert a link row and bump the domain frequency ledger.
  ///
  /// The platform label is derived from the URL's hostname and refined via
  /// the ledger's returning-upsert. If the link already exists, a NULL
  /// `creator_id` is backfilled from `creator_id`; a non-NULL association
  /// is never overwritten. Returns the id of the resulting row.
  fn insert_or_link_url<'a>(
    &'a self,
    creator_id: Option<i64>,
    url: &'a str,
    handle: Option<&'a str>,
    discovered_on: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Find a link row by exact canonical URL.
  ///
  /// This exists purely to skip redundant upstream work for known handles;
  /// the UNIQUE constraint on `link` remains the correctness mechanism
  /// under concurrent submission.
  fn find_link_by_url<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + 'a;

  /// Backfill the creator association of a placeholder link row.
  fn set_link_creator(
    &self,
    link_id: i64,
    creator_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Search creators and their links, optionally scoped to a subscription
  /// set.
  fn search<'a>(
    &'a self,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<CreatorHit>, Self::Error>> + Send + 'a;

  /// Group all links by creator for the creators owning `link_ids`.
  fn creators_for_links<'a>(
    &'a self,
    link_ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<CreatorWithLinks>, Self::Error>> + Send + 'a;
}
