//! SQL schema for the tontine SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per logical collection. The blob is the whole collection as JSON.
CREATE TABLE IF NOT EXISTS collections (
    key         TEXT PRIMARY KEY,   -- 'tontines' | 'users' | ...
    blob        TEXT NOT NULL,
    version     INTEGER NOT NULL DEFAULT 1,   -- bumped on every write
    updated_at  TEXT NOT NULL                 -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";
