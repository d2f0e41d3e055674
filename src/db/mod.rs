pub mod schema;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{RawAmount, TxRecord};

/// SQLite cache of fetched transaction lists, keyed by the queried address.
///
/// Address keys are lowercased, so lookups ignore case. Only raw records are
/// stored.
pub struct RecordCache {
    conn: Connection,
}

/// Thread-safe wrapper around RecordCache.
#[derive(Clone)]
pub struct SharedCache {
    inner: Arc<Mutex<RecordCache>>,
}

impl SharedCache {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let cache = RecordCache::open(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(cache)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RecordCache> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the cached list for `address`.
    pub fn store_records(&self, address: &str, records: &[TxRecord]) -> Result<(), rusqlite::Error> {
        self.lock().store_records(address, records)
    }

    /// Cached list for `address`, or `None` if it was never stored.
    pub fn cached_records(&self, address: &str) -> Result<Option<Vec<TxRecord>>, rusqlite::Error> {
        self.lock().cached_records(address)
    }

    /// When `address` was last stored.
    pub fn cached_at(&self, address: &str) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
        self.lock().cached_at(address)
    }

    /// Drop the cached list for `address`. Returns whether anything was cached.
    pub fn clear(&self, address: &str) -> Result<bool, rusqlite::Error> {
        self.lock().clear(address)
    }
}

impl RecordCache {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn store_records(&self, address: &str, records: &[TxRecord]) -> Result<(), rusqlite::Error> {
        let key = address.to_lowercase();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM tx_cache WHERE address = ?1", rusqlite::params![key])?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO tx_cache (address, position, hash, from_addr, to_addr, value, time_stamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (pos, r) in records.iter().enumerate() {
                stmt.execute(rusqlite::params![
                    key,
                    pos as i64,
                    r.hash,
                    r.from,
                    r.to,
                    r.value.as_ref().map(|v| v.to_string()),
                    r.timestamp,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO fetches (address, record_count, fetched_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, records.len() as i64, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn cached_records(&self, address: &str) -> Result<Option<Vec<TxRecord>>, rusqlite::Error> {
        let key = address.to_lowercase();
        let known: Option<i64> = self
            .conn
            .query_row(
                "SELECT record_count FROM fetches WHERE address = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        if known.is_none() {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "SELECT hash, from_addr, to_addr, value, time_stamp FROM tx_cache
             WHERE address = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(rusqlite::params![key], |row| {
            Ok(TxRecord {
                hash: row.get(0)?,
                from: row.get(1)?,
                to: row.get(2)?,
                value: row.get::<_, Option<String>>(3)?.map(RawAmount::Text),
                timestamp: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map(Some)
    }

    pub fn cached_at(&self, address: &str) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT fetched_at FROM fetches WHERE address = ?1",
                rusqlite::params![address.to_lowercase()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    pub fn clear(&self, address: &str) -> Result<bool, rusqlite::Error> {
        let key = address.to_lowercase();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM tx_cache WHERE address = ?1", rusqlite::params![key])?;
        let removed = tx.execute("DELETE FROM fetches WHERE address = ?1", rusqlite::params![key])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}
