//! SQL migration definitions for the plugindoc cache database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

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
        description: "Initial schema: cache_entries",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Memoized operation results
CREATE TABLE IF NOT EXISTS cache_entries (
    operation    TEXT NOT NULL,
    subject      TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    value        TEXT NOT NULL,
    created_at   INTEGER NOT NULL,
    expires_at   INTEGER NOT NULL,
    PRIMARY KEY (operation, subject, content_hash)
);

CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache_entries(expires_at);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
