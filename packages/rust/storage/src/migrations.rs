//! SQL migration definitions for the KeywordForge database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: keyword_batches, cluster_snapshots, outline_batches, users",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Normalized keyword submissions (append-only)
CREATE TABLE IF NOT EXISTS keyword_batches (
    id                TEXT PRIMARY KEY,
    submitter_id      TEXT NOT NULL,
    raw_keywords      TEXT NOT NULL,
    cleaned_keywords  TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_keyword_batches_created ON keyword_batches(created_at);

-- Clustering runs over the accumulated pool (append-only)
CREATE TABLE IF NOT EXISTS cluster_snapshots (
    id          TEXT PRIMARY KEY,
    groups_json TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cluster_snapshots_created ON cluster_snapshots(created_at);

-- Synthesized outline batches (append-only)
CREATE TABLE IF NOT EXISTS outline_batches (
    id           TEXT PRIMARY KEY,
    records_json TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_outline_batches_created ON outline_batches(created_at);

-- Per-user email preference for report delivery
CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY,
    email      TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
