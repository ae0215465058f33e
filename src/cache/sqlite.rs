use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{FeedfsError, Result};
use crate::cache::CacheStore;

/// Cache rows in SQLite, either on disk or in memory.
pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
}

impl SqliteCacheStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| FeedfsError::Other(format!("Cache migration failed: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            FeedfsError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;

        let payload = conn
            .query_row(
                "SELECT payload FROM feed_cache WHERE key = ?1 AND expires_at > ?2",
                params![key, now.timestamp_millis()],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;

        Ok(payload)
    }

    fn put(&self, key: &str, payload: &[u8], expires_at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO feed_cache (key, payload, stored_at, expires_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                stored_at = excluded.stored_at,
                expires_at = excluded.expires_at",
            params![
                key,
                payload,
                Utc::now().to_rfc3339(),
                expires_at.timestamp_millis()
            ],
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM feed_cache WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM feed_cache", [])?)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let conn = self.lock()?;
        let purged = conn.execute(
            "DELETE FROM feed_cache WHERE expires_at <= ?1",
            params![now.timestamp_millis()],
        )?;
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_put_and_get() {
        let store = SqliteCacheStore::in_memory().unwrap();
        let now = Utc::now();
        store
            .put("feed-examplecom", b"payload", now + Duration::minutes(5))
            .unwrap();

        let payload = store.get("feed-examplecom", now).unwrap();
        assert_eq!(payload, Some(b"payload".to_vec()));
    }

    #[test]
    fn test_put_overwrites() {
        let store = SqliteCacheStore::in_memory().unwrap();
        let now = Utc::now();
        store.put("k", b"one", now + Duration::minutes(5)).unwrap();
        store.put("k", b"two", now + Duration::minutes(5)).unwrap();

        assert_eq!(store.get("k", now).unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn test_expired_row_is_a_miss() {
        let store = SqliteCacheStore::in_memory().unwrap();
        let now = Utc::now();
        store.put("k", b"stale", now + Duration::minutes(1)).unwrap();

        assert!(store.get("k", now + Duration::minutes(2)).unwrap().is_none());
        assert_eq!(store.purge_expired(now + Duration::minutes(2)).unwrap(), 1);
        assert!(store.get("k", now).unwrap().is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let store = SqliteCacheStore::in_memory().unwrap();
        let later = Utc::now() + Duration::minutes(5);
        store.put("a", b"1", later).unwrap();
        store.put("b", b"2", later).unwrap();

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.clear().unwrap(), 1);
    }

    #[test]
    fn test_rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let later = Utc::now() + Duration::minutes(5);

        {
            let store = SqliteCacheStore::new(&path).unwrap();
            store.put("k", b"persisted", later).unwrap();
        }

        let store = SqliteCacheStore::new(&path).unwrap();
        assert_eq!(
            store.get("k", Utc::now()).unwrap(),
            Some(b"persisted".to_vec())
        );
    }
}
