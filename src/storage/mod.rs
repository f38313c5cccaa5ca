//! Search-history persistence.
//!
//! A single append-only SQLite table of past searches. Records are never
//! updated or deleted; reads return at most the 10 most recent entries.
//! The weather path treats this store as best-effort — a failing write is
//! logged by the caller, never surfaced.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

use crate::types::{LookupError, SearchHistoryEntry};

/// Listing cap — the UI only ever shows a small rolling window.
const RECENT_LIMIT: i64 = 10;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS search_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    city TEXT NOT NULL,
    date TEXT,
    time TEXT,
    created_at TEXT NOT NULL
)";

/// Handle to the history database. Cheap to clone; all clones share the
/// same connection pool.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Open (or create) the history database at `path` and ensure the
    /// schema exists.
    pub async fn open(path: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests. A single connection keeps every query on
    /// the same transient database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Append one search record and return its assigned id.
    ///
    /// `city` is the resolved name, not the raw query string. Empty-string
    /// `date`/`time` are stored as NULL — "provided as empty" and "not
    /// provided" are the same thing once persisted.
    pub async fn record(
        &self,
        city: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<i64, LookupError> {
        let date = date.filter(|s| !s.is_empty());
        let time = time.filter(|s| !s.is_empty());
        let created_at = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO search_history (city, date, time, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(city)
        .bind(date)
        .bind(time)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| LookupError::Storage(e.to_string()))?;

        let id = result.last_insert_rowid();
        debug!(id, city, "Search recorded");
        Ok(id)
    }

    /// Close the pool, waiting for in-flight writes to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// The most recent searches, newest first, capped at 10.
    pub async fn recent(&self) -> Result<Vec<SearchHistoryEntry>, LookupError> {
        sqlx::query_as::<_, SearchHistoryEntry>(
            "SELECT id, city, date, time, created_at FROM search_history \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LookupError::Storage(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
