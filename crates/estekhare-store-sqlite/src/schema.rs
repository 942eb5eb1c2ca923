//! SQL schema for the corpus store.
//!
//! Executed at every connection startup. `PRAGMA user_version` gates future
//! migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Append-only and written once: rows are inserted by the first ingestion
-- against an empty table and never updated or deleted afterwards.
-- AUTOINCREMENT keeps ids from ever being reused.
CREATE TABLE IF NOT EXISTS istikhara (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    page_number      TEXT NOT NULL DEFAULT '',
    surah_name       TEXT NOT NULL DEFAULT '',
    verse_number     TEXT NOT NULL DEFAULT '',
    verse_text       TEXT NOT NULL DEFAULT '',
    translation      TEXT NOT NULL DEFAULT '',
    istikhara_result TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS istikhara_page_idx ON istikhara(page_number);

PRAGMA user_version = 1;
";
