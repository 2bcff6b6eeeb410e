//! SQLite backend
//!
//! Every write runs inside a transaction and returns only after the
//! transaction has committed. Work happens on the blocking pool so
//! callers on the async runtime never wait on disk I/O directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use sm_core::{
    AnnotationPatch, AnnotationSet, AnnotationStore, Backend, Dataset, DatasetStore, FileIdentity,
    PageStore, RowAnnotation, StoreError, StoreResult,
};
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS datasets (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        row_count INTEGER NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS annotations (
        file_key TEXT PRIMARY KEY,
        states TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS pages (
        file_key TEXT PRIMARY KEY,
        page INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS session (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

const CURRENT_FILE_KEY: &str = "current_file_key";
const CURRENT_PAGE: &str = "current_page";

/// Backend persisting every partition to one SQLite database
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|e| StoreError::Unavailable(format!("Failed to open {}: {}", path.display(), e)))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .and_then(|_| conn.pragma_update(None, "synchronous", "FULL"))
            .map_err(|e| StoreError::Unavailable(format!("Failed to configure database: {}", e)))?;

        let backend = Self::from_connection(conn, Some(path.clone()))?;
        info!(path = %path.display(), "Opened SQLite store");
        Ok(backend)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Unavailable(format!("Failed to create schema: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("Store task failed: {}", e)))?
    }

    async fn session_value(&self, key: &'static str) -> StoreResult<Option<String>> {
        self.with_conn(move |conn| {
            conn.query_row("SELECT value FROM session WHERE key = ?1", params![key], |row| row.get(0))
                .optional()
                .map_err(read_err)
        })
        .await
    }

    async fn set_session_value(&self, key: &'static str, value: Option<String>) -> StoreResult<()> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(commit_err)?;
            let written = match value {
                Some(value) => tx.execute(
                    "INSERT INTO session (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                ),
                None => tx.execute("DELETE FROM session WHERE key = ?1", params![key]),
            };
            written.map_err(commit_err)?;
            tx.commit().map_err(commit_err)
        })
        .await
    }
}

fn read_err(e: rusqlite::Error) -> StoreError {
    StoreError::Read(e.to_string())
}

fn commit_err(e: rusqlite::Error) -> StoreError {
    StoreError::Commit(e.to_string())
}

fn corrupt(key: &str, reason: impl ToString) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_page(key: &str, raw: i64) -> StoreResult<u32> {
    u32::try_from(raw)
        .ok()
        .filter(|page| *page >= 1)
        .ok_or_else(|| corrupt(key, format!("invalid page number {}", raw)))
}

fn load_annotations(conn: &Connection, key: &str) -> StoreResult<AnnotationSet> {
    let states: Option<String> = conn
        .query_row("SELECT states FROM annotations WHERE file_key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(read_err)?;

    match states {
        Some(json) => serde_json::from_str(&json).map_err(|e| corrupt(key, e)),
        None => Ok(AnnotationSet::default()),
    }
}

#[async_trait]
impl DatasetStore for SqliteBackend {
    async fn put_dataset(&self, id: &FileIdentity, dataset: &Dataset) -> StoreResult<()> {
        let key = id.as_str().to_string();
        let data = serde_json::to_string(dataset)?;
        let row_count = dataset.len() as i64;

        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(commit_err)?;
            tx.execute(
                "INSERT INTO datasets (id, data, row_count, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    data = excluded.data,
                    row_count = excluded.row_count,
                    updated_at = excluded.updated_at",
                params![key, data, row_count, Utc::now().to_rfc3339()],
            )
            .map_err(commit_err)?;
            tx.commit().map_err(commit_err)?;
            debug!(file = %key, rows = row_count, "Dataset committed");
            Ok(())
        })
        .await
    }

    async fn get_dataset(&self, id: &FileIdentity) -> StoreResult<Option<Dataset>> {
        let key = id.as_str().to_string();
        self.with_conn(move |conn| {
            let data: Option<String> = conn
                .query_row("SELECT data FROM datasets WHERE id = ?1", params![key], |row| row.get(0))
                .optional()
                .map_err(read_err)?;

            data.map(|json| serde_json::from_str(&json).map_err(|e| corrupt(&key, e)))
                .transpose()
        })
        .await
    }

    async fn delete_dataset(&self, id: &FileIdentity) -> StoreResult<()> {
        let key = id.as_str().to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(commit_err)?;
            tx.execute("DELETE FROM datasets WHERE id = ?1", params![key])
                .map_err(commit_err)?;
            tx.commit().map_err(commit_err)
        })
        .await
    }
}

#[async_trait]
impl AnnotationStore for SqliteBackend {
    async fn annotations(&self, id: &FileIdentity) -> StoreResult<AnnotationSet> {
        let key = id.as_str().to_string();
        self.with_conn(move |conn| load_annotations(conn, &key)).await
    }

    async fn merge_row(
        &self,
        id: &FileIdentity,
        idx: usize,
        patch: &AnnotationPatch,
    ) -> StoreResult<RowAnnotation> {
        let key = id.as_str().to_string();
        let patch = *patch;

        self.with_conn(move |conn| {
            // Read and write under one write lock so the merge always sees the latest set.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(commit_err)?;

            let mut set = load_annotations(&tx, &key)?;
            let merged = set.merge_row(idx, &patch);
            let states = serde_json::to_string(&set)?;

            tx.execute(
                "INSERT INTO annotations (file_key, states, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(file_key) DO UPDATE SET
                    states = excluded.states,
                    updated_at = excluded.updated_at",
                params![key, states, Utc::now().to_rfc3339()],
            )
            .map_err(commit_err)?;
            tx.commit().map_err(commit_err)?;

            Ok(merged)
        })
        .await
    }

    async fn clear_annotations(&self, id: &FileIdentity) -> StoreResult<()> {
        let key = id.as_str().to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(commit_err)?;
            tx.execute("DELETE FROM annotations WHERE file_key = ?1", params![key])
                .map_err(commit_err)?;
            tx.commit().map_err(commit_err)
        })
        .await
    }
}

#[async_trait]
impl PageStore for SqliteBackend {
    async fn last_page(&self, id: &FileIdentity) -> StoreResult<Option<u32>> {
        let key = id.as_str().to_string();
        self.with_conn(move |conn| {
            let raw: Option<i64> = conn
                .query_row("SELECT page FROM pages WHERE file_key = ?1", params![key], |row| row.get(0))
                .optional()
                .map_err(read_err)?;
            raw.map(|raw| parse_page(&key, raw)).transpose()
        })
        .await
    }

    async fn set_last_page(&self, id: &FileIdentity, page: u32) -> StoreResult<()> {
        let key = id.as_str().to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(commit_err)?;
            tx.execute(
                "INSERT INTO pages (file_key, page) VALUES (?1, ?2)
                 ON CONFLICT(file_key) DO UPDATE SET page = excluded.page",
                params![key, page],
            )
            .map_err(commit_err)?;
            tx.commit().map_err(commit_err)
        })
        .await
    }

    async fn global_page(&self) -> StoreResult<Option<u32>> {
        self.session_value(CURRENT_PAGE)
            .await?
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|e| corrupt(CURRENT_PAGE, e))
                    .and_then(|raw| parse_page(CURRENT_PAGE, raw))
            })
            .transpose()
    }

    async fn set_global_page(&self, page: u32) -> StoreResult<()> {
        self.set_session_value(CURRENT_PAGE, Some(page.to_string())).await
    }

    async fn current_identity(&self) -> StoreResult<Option<FileIdentity>> {
        Ok(self.session_value(CURRENT_FILE_KEY).await?.map(FileIdentity::from_key))
    }

    async fn set_current_identity(&self, id: Option<&FileIdentity>) -> StoreResult<()> {
        let value = id.map(|id| id.as_str().to_string());
        self.set_session_value(CURRENT_FILE_KEY, value).await
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }
}
