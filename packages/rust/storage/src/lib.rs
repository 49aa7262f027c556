//! libSQL-backed on-disk cache.
//!
//! The [`Cache`] struct memoizes expensive build steps (extractor runs, badge
//! fetches). Entries are keyed by `(operation, subject, content_hash)` and carry
//! an absolute expiry time; a changed source hash or an elapsed expiry both
//! read as a miss.
//!
//! There is no locking: only one documentation build uses the cache at a time.

mod migrations;

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use libsql::{Connection, Database, params};
use plugindoc_shared::{PluginDocError, Result};

/// Cache handle wrapping a libSQL database.
pub struct Cache {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

/// Entry counts reported by [`Cache::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// All stored entries, live or expired.
    pub total: u64,
    /// Entries past their expiry that have not been purged yet.
    pub expired: u64,
    /// `(operation, count)` pairs, sorted by operation.
    pub by_operation: Vec<(String, u64)>,
}

fn storage_err(e: impl std::fmt::Display) -> PluginDocError {
    PluginDocError::Storage(e.to_string())
}

impl Cache {
    /// Open or create a cache database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PluginDocError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        Self::from_database(db).await
    }

    /// Open a throwaway in-memory cache.
    pub async fn open_in_memory() -> Result<Self> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(storage_err)?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect().map_err(storage_err)?;
        let cache = Self { db, conn };
        cache.run_migrations().await?;
        Ok(cache)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    PluginDocError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Entries
    // -----------------------------------------------------------------------

    /// Look up a live entry.
    pub async fn get(
        &self,
        operation: &str,
        subject: &str,
        content_hash: &str,
    ) -> Result<Option<String>> {
        let now = Utc::now().timestamp();
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM cache_entries
                 WHERE operation = ?1 AND subject = ?2 AND content_hash = ?3 AND expires_at > ?4",
                params![operation, subject, content_hash, now],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row.get::<String>(0).map_err(storage_err)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Store an entry that lives for `ttl`.
    ///
    /// Entries for the same `(operation, subject)` under other hashes are
    /// dropped; they can never be hit again.
    pub async fn set(
        &self,
        operation: &str,
        subject: &str,
        content_hash: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<()> {
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl_secs);

        self.conn
            .execute(
                "DELETE FROM cache_entries
                 WHERE operation = ?1 AND subject = ?2 AND content_hash != ?3",
                params![operation, subject, content_hash],
            )
            .await
            .map_err(storage_err)?;

        self.conn
            .execute(
                "INSERT INTO cache_entries (operation, subject, content_hash, value, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(operation, subject, content_hash) DO UPDATE SET
                   value = excluded.value,
                   created_at = excluded.created_at,
                   expires_at = excluded.expires_at",
                params![operation, subject, content_hash, value, now, expires_at],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(operation, subject, expires_at, "cache entry stored");
        Ok(())
    }

    /// Delete expired entries. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now().timestamp();
        let removed = self
            .conn
            .execute(
                "DELETE FROM cache_entries WHERE expires_at <= ?1",
                params![now],
            )
            .await
            .map_err(storage_err)?;
        tracing::info!(removed, "purged expired cache entries");
        Ok(removed)
    }

    /// Delete every entry. Returns how many were removed.
    pub async fn clear(&self) -> Result<u64> {
        let removed = self
            .conn
            .execute("DELETE FROM cache_entries", params![])
            .await
            .map_err(storage_err)?;
        tracing::info!(removed, "cleared cache");
        Ok(removed)
    }

    /// Count stored entries.
    pub async fn stats(&self) -> Result<CacheStats> {
        let now = Utc::now().timestamp();
        let mut stats = CacheStats::default();

        let mut rows = self
            .conn
            .query(
                "SELECT operation, COUNT(*), SUM(CASE WHEN expires_at <= ?1 THEN 1 ELSE 0 END)
                 FROM cache_entries GROUP BY operation ORDER BY operation",
                params![now],
            )
            .await
            .map_err(storage_err)?;

        while let Ok(Some(row)) = rows.next().await {
            let operation: String = row.get(0).map_err(storage_err)?;
            let count: i64 = row.get(1).map_err(storage_err)?;
            let expired: i64 = row.get(2).unwrap_or(0);
            stats.total += count as u64;
            stats.expired += expired as u64;
            stats.by_operation.push((operation, count as u64));
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const DAY: Duration = Duration::from_secs(86_400);

    async fn test_cache() -> Cache {
        Cache::open_in_memory().await.expect("open in-memory cache")
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let cache = test_cache().await;
        assert_eq!(cache.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("plugindoc_test_{}.db", Uuid::now_v7()));
        let first = Cache::open(&tmp).await.expect("first open");
        first
            .set("plugin_description", "plugin-a", "h1", "{}", DAY)
            .await
            .unwrap();
        drop(first);

        let second = Cache::open(&tmp).await.expect("second open");
        assert_eq!(second.get_schema_version().await, 1);
        let hit = second.get("plugin_description", "plugin-a", "h1").await.unwrap();
        assert_eq!(hit.as_deref(), Some("{}"));
        let _ = std::fs::remove_file(&tmp);
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = test_cache().await;
        assert!(cache.get("badge", "Author", "abc").await.unwrap().is_none());

        cache
            .set("badge", "Author", "abc", "<svg/>", DAY)
            .await
            .unwrap();
        let hit = cache.get("badge", "Author", "abc").await.unwrap();
        assert_eq!(hit.as_deref(), Some("<svg/>"));
    }

    #[tokio::test]
    async fn hash_change_is_a_miss_and_drops_stale_entry() {
        let cache = test_cache().await;
        cache
            .set("plugin_description", "plugin-a", "old", "v1", DAY)
            .await
            .unwrap();
        assert!(
            cache
                .get("plugin_description", "plugin-a", "new")
                .await
                .unwrap()
                .is_none()
        );

        cache
            .set("plugin_description", "plugin-a", "new", "v2", DAY)
            .await
            .unwrap();
        assert!(
            cache
                .get("plugin_description", "plugin-a", "old")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(cache.stats().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn expired_entries_are_misses_and_purgeable() {
        let cache = test_cache().await;
        cache
            .set("badge", "Current version", "h", "<svg/>", Duration::ZERO)
            .await
            .unwrap();
        assert!(cache.get("badge", "Current version", "h").await.unwrap().is_none());

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.expired, 1);

        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn upsert_overwrites_value() {
        let cache = test_cache().await;
        cache.set("op", "s", "h", "first", DAY).await.unwrap();
        cache.set("op", "s", "h", "second", DAY).await.unwrap();
        assert_eq!(cache.get("op", "s", "h").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn clear_and_stats_by_operation() {
        let cache = test_cache().await;
        cache.set("badge", "a", "1", "x", DAY).await.unwrap();
        cache.set("badge", "b", "1", "x", DAY).await.unwrap();
        cache
            .set("plugin_description", "p", "1", "{}", DAY)
            .await
            .unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.by_operation,
            vec![("badge".to_string(), 2), ("plugin_description".to_string(), 1)]
        );

        assert_eq!(cache.clear().await.unwrap(), 3);
        assert_eq!(cache.stats().await.unwrap(), CacheStats::default());
    }
}
