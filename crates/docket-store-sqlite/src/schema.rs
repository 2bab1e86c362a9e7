//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup. Every logical table shares the `rows`
//! table; `tbl` names the partition and `body` holds the JSON row.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS rows (
    tbl         TEXT NOT NULL,   -- logical table, e.g. 'cases'
    id          TEXT NOT NULL,   -- hyphenated lowercase UUID
    body        TEXT NOT NULL,   -- JSON object, snake_case columns
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    PRIMARY KEY (tbl, id)
);

CREATE INDEX IF NOT EXISTS rows_created_idx ON rows(tbl, created_at);

PRAGMA user_version = 1;
";
