//! [`SqliteStore`] — the SQLite implementation of [`CreatorStore`].
//!
//! All mutations are single-statement upserts with `ON CONFLICT` clauses,
//! so concurrent writers converge without cross-statement transactions: the
//! first successful insert wins the row, and conflict read-back resolves
//! the loser to the winner's id.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use finder_core::{
  model::{Creator, CreatorHit, CreatorWithLinks, Link, LinkRef, SOURCE_PLATFORM},
  platform,
  store::{CreatorStore, SearchQuery},
};

use crate::{Error, Result, schema::SCHEMA};

fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

fn decode_dt(raw: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{raw:?}: {e}")))
}

/// Render an id list as a SQL `IN` body. Safe to interpolate: the ids are
/// integers, not strings.
fn id_list(ids: &[i64]) -> String {
  let parts: Vec<String> = ids.iter().map(i64::to_string).collect();
  parts.join(",")
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A creator/link store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Row reads ───────────────────────────────────────────────────────────

  /// Fetch a creator row by id.
  pub async fn get_creator(&self, id: i64) -> Result<Option<Creator>> {
    let raw: Option<(i64, String, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, name, discovered_on, first_seen
               FROM creators WHERE id = ?1",
              rusqlite::params![id],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(id, name, discovered_on, first_seen)| {
        Ok(Creator {
          id,
          name,
          discovered_on,
          first_seen: decode_dt(&first_seen)?,
        })
      })
      .transpose()
  }

  /// Fetch a link row by id.
  pub async fn get_link(&self, id: i64) -> Result<Option<Link>> {
    type RawLink =
      (i64, Option<i64>, String, Option<String>, String, String, String);

    let raw: Option<RawLink> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, creator_id, platform, handle, link, discovered_on,
                      first_seen
               FROM links WHERE id = ?1",
              rusqlite::params![id],
              |row| {
                Ok((
                  row.get(0)?,
                  row.get(1)?,
                  row.get(2)?,
                  row.get(3)?,
                  row.get(4)?,
                  row.get(5)?,
                  row.get(6)?,
                ))
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(
        |(id, creator_id, platform, handle, link, discovered_on, first_seen)| {
          Ok(Link {
            id,
            creator_id,
            platform,
            handle,
            link,
            discovered_on,
            first_seen: decode_dt(&first_seen)?,
          })
        },
      )
      .transpose()
  }

  /// Current `(platform, quantity)` entry of the domain frequency ledger.
  pub async fn domain_ledger(
    &self,
    domain: &str,
  ) -> Result<Option<(String, i64)>> {
    let domain = domain.to_owned();
    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT platform, quantity FROM domains WHERE domain = ?1",
              rusqlite::params![domain],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(row)
  }
}

// ─── CreatorStore impl ───────────────────────────────────────────────────────

impl CreatorStore for SqliteStore {
  type Error = Error;

  async fn get_or_create_creator(&self, name: &str) -> Result<i64> {
    // Name policy: trimmed, case-sensitive exact match.
    let name = name.trim().to_owned();
    let name_for_err = name.clone();
    let now_str = encode_dt(Utc::now());

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let existing: Option<i64> = conn
          .query_row(
            "SELECT id FROM creators WHERE name = ?1",
            rusqlite::params![name],
            |row| row.get(0),
          )
          .optional()?;
        if existing.is_some() {
          return Ok(existing);
        }

        // DO NOTHING on conflict: a concurrent caller may have inserted the
        // same name between our lookup and this statement.
        let inserted: Option<i64> = conn
          .query_row(
            "INSERT INTO creators (name, discovered_on, first_seen)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO NOTHING
             RETURNING id",
            rusqlite::params![name, SOURCE_PLATFORM, now_str],
            |row| row.get(0),
          )
          .optional()?;
        if inserted.is_some() {
          return Ok(inserted);
        }

        // Lost the race; read back the winner.
        Ok(
          conn
            .query_row(
              "SELECT id FROM creators WHERE name = ?1",
              rusqlite::params![name],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    id.ok_or_else(|| {
      Error::Inconsistency(format!(
        "creator {name_for_err:?} missing after insert conflict"
      ))
    })
  }

  async fn insert_or_link_url(
    &self,
    creator_id: Option<i64>,
    url: &str,
    handle: Option<&str>,
    discovered_on: &str,
  ) -> Result<i64> {
    let domain = platform::domain_of(url)?;
    let label = platform::platform_label(&domain);

    let url_str = url.to_owned();
    let url_for_err = url.to_owned();
    let handle_str = handle.map(str::to_owned);
    let discovered_str = discovered_on.to_owned();
    let now_str = encode_dt(Utc::now());

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        // Bump the domain ledger and take the current canonical label (most
        // recent write wins). The upsert always touches exactly one row, so
        // RETURNING yields it.
        let canonical_label: String = conn.query_row(
          "INSERT INTO domains (domain, platform, quantity)
           VALUES (?1, ?2, 1)
           ON CONFLICT(domain) DO UPDATE SET
             quantity = quantity + 1,
             platform = excluded.platform
           RETURNING platform",
          rusqlite::params![domain, label],
          |row| row.get(0),
        )?;

        // Backfill a NULL creator_id on conflict; never overwrite a
        // resolved association.
        let inserted: Option<i64> = conn
          .query_row(
            "INSERT INTO links
               (creator_id, platform, handle, link, discovered_on, first_seen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(link) DO UPDATE SET
               creator_id = COALESCE(creator_id, excluded.creator_id)
             RETURNING id",
            rusqlite::params![
              creator_id,
              canonical_label,
              handle_str,
              url_str,
              discovered_str,
              now_str,
            ],
            |row| row.get(0),
          )
          .optional()?;
        if inserted.is_some() {
          return Ok(inserted);
        }

        // Defensive fallback for an upsert that returned nothing.
        Ok(
          conn
            .query_row(
              "SELECT id FROM links WHERE link = ?1",
              rusqlite::params![url_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    id.ok_or_else(|| {
      Error::Inconsistency(format!("link {url_for_err:?} missing after upsert"))
    })
  }

  async fn find_link_by_url(&self, url: &str) -> Result<Option<i64>> {
    let url = url.to_owned();
    let id = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id FROM links WHERE link = ?1",
              rusqlite::params![url],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(id)
  }

  async fn set_link_creator(&self, link_id: i64, creator_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE links SET creator_id = ?1 WHERE id = ?2",
          rusqlite::params![creator_id, link_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn search(&self, query: &SearchQuery) -> Result<Vec<CreatorHit>> {
    let pattern = format!("%{}%", query.text);
    let scope = query.within_links.clone();
    let limit = query.limit.max(1) as i64;
    let offset = query.offset as i64;

    let hits: Vec<CreatorHit> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT creators.name, links.platform, links.handle, links.link
           FROM creators
           JOIN links ON creators.id = links.creator_id
           WHERE (creators.name LIKE ?1
                  OR links.handle LIKE ?1
                  OR links.link LIKE ?1)",
        );

        // Subscription scoping: restrict to creators reachable from the
        // caller's subscribed link ids.
        if !scope.is_empty() {
          sql.push_str(&format!(
            " AND creators.id IN (
                SELECT links.creator_id FROM links
                WHERE links.id IN ({})
                  AND links.creator_id IS NOT NULL
              )",
            id_list(&scope)
          ));
        }

        sql.push_str(" ORDER BY creators.name, links.link LIMIT ?2 OFFSET ?3");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit, offset], |row| {
            Ok(CreatorHit {
              name:     row.get(0)?,
              platform: row.get(1)?,
              handle:   row.get(2)?,
              link:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    Ok(hits)
  }

  async fn creators_for_links(
    &self,
    link_ids: &[i64],
  ) -> Result<Vec<CreatorWithLinks>> {
    if link_ids.is_empty() {
      return Ok(Vec::new());
    }
    let scope = id_list(link_ids);

    let rows: Vec<(String, String, Option<String>, String)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT creators.name, links.platform, links.handle, links.link
           FROM creators
           JOIN links ON creators.id = links.creator_id
           WHERE creators.id IN (
             SELECT links.creator_id FROM links
             WHERE links.id IN ({scope})
               AND links.creator_id IS NOT NULL
           )
           ORDER BY creators.name, links.link"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    // Group consecutive rows (ordered by name) into one entry per creator.
    let mut creators: Vec<CreatorWithLinks> = Vec::new();
    for (name, platform, handle, link) in rows {
      let link_ref = LinkRef { platform, handle, link };
      match creators.last_mut() {
        Some(current) if current.name == name => current.links.push(link_ref),
        _ => creators.push(CreatorWithLinks { name, links: vec![link_ref] }),
      }
    }

    Ok(creators)
  }
}
