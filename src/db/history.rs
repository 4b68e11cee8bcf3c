//! History record operations
//!
//! Records are append-only: created once per handled query, never updated
//! or deleted.

use super::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One durably stored query/response pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub query_text: String,
    pub response_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Parameters for appending a new history record.
///
/// The timestamp is captured by the orchestrator when the query arrives, not
/// at insert time, so the stored instant matches the one returned to the
/// caller.
#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    pub user_id: String,
    pub session_id: String,
    pub query_text: String,
    pub response_text: String,
    pub timestamp: DateTime<Utc>,
}

impl Database {
    /// Append a history record, assigning a fresh id
    pub fn append_history(&self, params: NewHistoryRecord) -> Result<HistoryRecord> {
        let id = Uuid::new_v4().to_string();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO query_history (id, user_id, session_id, query_text, response_text, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            (
                &id,
                &params.user_id,
                &params.session_id,
                &params.query_text,
                &params.response_text,
                params.timestamp.to_rfc3339(),
            ),
        )
        .context("Failed to append history record")?;

        Ok(HistoryRecord {
            id,
            user_id: params.user_id,
            session_id: params.session_id,
            query_text: params.query_text,
            response_text: params.response_text,
            timestamp: params.timestamp,
        })
    }

    /// List a user's records, newest first; ties broken by insertion order
    pub fn history_for_user(&self, user_id: &str) -> Result<Vec<HistoryRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, session_id, query_text, response_text, timestamp
            FROM query_history
            WHERE user_id = ?1
            ORDER BY timestamp DESC, rowid DESC
            "#,
        )?;

        let records = stmt
            .query_map([user_id], |row| {
                let timestamp: String = row.get(5)?;

                Ok(HistoryRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    session_id: row.get(2)?,
                    query_text: row.get(3)?,
                    response_text: row.get(4)?,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)
                        .unwrap()
                        .with_timezone(&Utc),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
