//! SQL schema for the cardex SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per record of every entity kind. The natural key is
-- (kind, codename); record_id is generated on first insert and kept on
-- every later upsert.
CREATE TABLE IF NOT EXISTS records (
    record_id   TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,   -- EntityKind discriminant, e.g. 'faction'
    codename    TEXT NOT NULL,
    body_json   TEXT NOT NULL,   -- serialised record, surface id excluded
    updated_at  TEXT NOT NULL,   -- RFC 3339 UTC
    UNIQUE (kind, codename)
);

CREATE INDEX IF NOT EXISTS records_kind_idx ON records(kind);

PRAGMA user_version = 1;
";
