//! SQLite-backed version repository.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::repository::VersionRepository;
use crate::schema::SCHEMA_SQL;
use crate::types::ContentVersion;
use alwrity_core::{Error, Result, SearchMetrics};

/// Durable version store in a single SQLite file.
pub struct SqliteVersionStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteVersionStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/alwrity.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("alwrity.db");

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!(
            "SqliteVersionStore initialized: {} versions, path={}",
            store.count()?,
            store.db_path.display()
        );
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_version(row: &rusqlite::Row<'_>) -> ContentVersion {
        ContentVersion {
            id: row.get("id").unwrap_or_default(),
            content: row.get("content").unwrap_or_default(),
            timestamp: row.get("timestamp").unwrap_or(0),
            metrics: row
                .get::<_, Option<String>>("metrics_json")
                .ok()
                .flatten()
                .and_then(|s| serde_json::from_str(&s).ok()),
        }
    }
}

impl VersionRepository for SqliteVersionStore {
    fn save(&self, version: &ContentVersion) -> Result<()> {
        let metrics_json = version
            .metrics
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO content_versions (id, content, timestamp, metrics_json) VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![version.id, version.content, version.timestamp, metrics_json])
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                Error::InvalidInput(format!("version {} already exists", version.id))
            } else {
                Error::Database(e.to_string())
            }
        })?;
        debug!("Saved version {} ({} bytes)", version.id, version.content.len());
        Ok(())
    }

    fn list(&self) -> Result<Vec<ContentVersion>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM content_versions ORDER BY timestamp ASC, id ASC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_version(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        let versions = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(versions)
    }

    fn get(&self, id: &str) -> Result<Option<ContentVersion>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM content_versions WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| Ok(Self::row_to_version(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    fn update_metrics(&self, id: &str, metrics: &SearchMetrics) -> Result<bool> {
        let json = serde_json::to_string(metrics)?;
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE content_versions SET metrics_json = ?1 WHERE id = ?2",
                params![json, id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM content_versions WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM content_versions", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(n as usize)
    }
}
