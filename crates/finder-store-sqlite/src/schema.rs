//! SQL schema for the Creator Finder SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `user_version` pragma.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS creators (
    id            INTEGER PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,  -- display name; natural key
    discovered_on TEXT NOT NULL,         -- provenance platform tag
    first_seen    TEXT NOT NULL          -- ISO 8601 UTC
);

-- creator_id is NULL for placeholder rows awaiting async enrichment.
CREATE TABLE IF NOT EXISTS links (
    id            INTEGER PRIMARY KEY,
    creator_id    INTEGER REFERENCES creators(id),
    platform      TEXT NOT NULL,         -- label from the domain ledger
    handle        TEXT,                  -- original submitted input, if any
    link          TEXT NOT NULL UNIQUE,  -- canonical URL
    discovered_on TEXT NOT NULL,         -- platform tag or originating link
    first_seen    TEXT NOT NULL
);

-- Domain frequency ledger: how often each hostname has been seen, and the
-- canonical platform label for it (the most recent write wins the label).
CREATE TABLE IF NOT EXISTS domains (
    domain   TEXT PRIMARY KEY,
    platform TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS links_creator_idx ON links(creator_id);

PRAGMA user_version = 1;
";
