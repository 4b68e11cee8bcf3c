//! Database module for query history persistence
//!
//! Uses SQLite to store query/response pairs in ~/.qna/history.db

pub mod history;
pub mod schema;

pub use history::{HistoryRecord, NewHistoryRecord};

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the default location (~/.qna/history.db)
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    /// Open or create the database at a specific path
    pub fn open_at(path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        tracing::info!("Database opened at {:?}", path);
        Ok(db)
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".qna").join("history.db"))
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        schema::create_tables(&conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open_at(path.clone()).unwrap();
        assert!(path.exists());
        drop(db);
    }

    #[test]
    fn test_database_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let db = Database::open_at(path.clone()).unwrap();
            db.append_history(NewHistoryRecord {
                user_id: "user-1".to_string(),
                session_id: "session-1".to_string(),
                query_text: "a query long enough".to_string(),
                response_text: "an answer".to_string(),
                timestamp: chrono::Utc::now(),
            })
            .unwrap();
        }

        let db = Database::open_at(path).unwrap();
        let records = db.history_for_user("user-1").unwrap();
        assert_eq!(records.len(), 1);
    }
}
