use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::SkipError;
use crate::model::{CacheEntry, DetectionSource, Segment};

const SCHEMA_V1: &str = include_str!("../../../../migrations/001_skip_cache.sql");

/// SQLite-backed storage for detection results, keyed by content cache key.
pub struct CacheStore {
    conn: Connection,
}

impl CacheStore {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, SkipError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, SkipError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Fetch the entry for `key`. Fails with `Serde` if the stored segments
    /// cannot be decoded.
    pub fn get(&self, key: &str) -> Result<Option<CacheEntry>, SkipError> {
        let row = self
            .conn
            .query_row(
                "SELECT cache_key, segments, source, confidence, stored_at
                 FROM skip_cache WHERE cache_key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((key, segments, source, confidence, stored_at)) = row else {
            return Ok(None);
        };
        let segments: Vec<Segment> = serde_json::from_str(&segments)?;
        Ok(Some(CacheEntry {
            key,
            segments,
            stored_at: parse_datetime(&stored_at),
            source: DetectionSource::from_db_str(&source).unwrap_or(DetectionSource::None),
            confidence: confidence as f32,
        }))
    }

    /// Insert or overwrite the entry for `entry.key`.
    pub fn put(&self, entry: &CacheEntry) -> Result<(), SkipError> {
        let segments = serde_json::to_string(&entry.segments)?;
        self.conn.execute(
            "INSERT INTO skip_cache (cache_key, segments, source, confidence, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(cache_key) DO UPDATE SET
                segments = excluded.segments,
                source = excluded.source,
                confidence = excluded.confidence,
                stored_at = excluded.stored_at",
            params![
                entry.key,
                segments,
                entry.source.as_db_str(),
                entry.confidence as f64,
                format_datetime(entry.stored_at),
            ],
        )?;
        Ok(())
    }

    /// Delete the entry for `key`. Returns whether one existed.
    pub fn delete(&self, key: &str) -> Result<bool, SkipError> {
        let n = self
            .conn
            .execute("DELETE FROM skip_cache WHERE cache_key = ?1", params![key])?;
        Ok(n > 0)
    }

    /// Delete every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, SkipError> {
        Ok(self.conn.execute("DELETE FROM skip_cache", [])?)
    }

    /// Delete entries stored before `cutoff`.
    pub fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, SkipError> {
        Ok(self.conn.execute(
            "DELETE FROM skip_cache WHERE stored_at < ?1",
            params![format_datetime(cutoff)],
        )?)
    }

    pub fn count(&self) -> Result<usize, SkipError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM skip_cache", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn run_migrations(conn: &Connection) -> Result<(), SkipError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

/// Fixed-width UTC timestamp, so text order in SQLite matches time order.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string from SQLite (either RFC 3339 or SQLite's `datetime('now')` format).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    DateTime::default()
}
