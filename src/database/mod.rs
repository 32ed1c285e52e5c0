pub mod models;
pub mod repositories;

use log::info;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unknown identity: {0}")]
    UnknownIdentity(i64),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Handle to the backing SQLite store. Cheap to clone; all clones share one
/// connection behind a mutex. The correctness-critical invariants (one
/// identity per fingerprint, one processing record per identity) are enforced
/// by the schema, not by callers.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
        let db = Self::from_connection(conn)?;
        info!("opened processing store at {}", path.as_ref().display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::StorageUnavailable("connection mutex poisoned".to_string()))
    }
}

fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS identities (
            id INTEGER PRIMARY KEY,
            fingerprint TEXT UNIQUE NOT NULL,
            source_name TEXT NOT NULL,
            content_kind TEXT NOT NULL,
            byte_size INTEGER NOT NULL,
            width INTEGER,
            height INTEGER,
            first_seen_at TEXT NOT NULL,
            last_seen_at TEXT NOT NULL,
            seen_count INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS processing_records (
            identity_id INTEGER PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
            artifact_paths TEXT NOT NULL,
            boundary_params TEXT NOT NULL,
            shape_params TEXT NOT NULL,
            enrichment_metadata TEXT,
            processed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS activity_entries (
            id INTEGER PRIMARY KEY,
            session_id TEXT NOT NULL,
            identity_id INTEGER NOT NULL REFERENCES identities(id),
            action TEXT NOT NULL,
            occurred_at TEXT NOT NULL,
            details TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_activity_session ON activity_entries(session_id);
        CREATE INDEX IF NOT EXISTS idx_activity_identity ON activity_entries(identity_id);
        CREATE INDEX IF NOT EXISTS idx_activity_occurred ON activity_entries(occurred_at);",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_schema() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::open(&db_path).unwrap();
        let conn = db.conn().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('identities', 'processing_records', 'activity_entries')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        Database::open(&db_path).unwrap();
        Database::open(&db_path).unwrap();
    }
}
