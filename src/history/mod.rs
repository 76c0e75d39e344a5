use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

use crate::core::errors::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Human,
    Ai,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::Human => "human",
            ChatRole::Ai => "ai",
        }
    }

    fn from_db(value: &str) -> ChatRole {
        match value {
            "ai" => ChatRole::Ai,
            _ => ChatRole::Human,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub role: ChatRole,
    pub content: String,
    pub created_at: String,
}

/// Message storage for per-document conversations, keyed by
/// (user id, document id).
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, PipelineError> {
        let conn_str = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await
            .map_err(|e| {
                PipelineError::history(format!("Failed to connect to history db: {}", e))
            })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                document_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| PipelineError::history(format!("Failed to init messages table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation
             ON messages(user_id, document_id)",
        )
        .execute(&pool)
        .await
        .map_err(|e| PipelineError::history(format!("Failed to create index: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn append(
        &self,
        user_id: &str,
        document_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<i64, PipelineError> {
        check_conversation_key(user_id, document_id)?;
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO messages (user_id, document_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(document_id)
        .bind(role.as_str())
        .bind(content)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(PipelineError::history)?;

        Ok(result.last_insert_rowid())
    }

    /// Returns the most recent `limit` messages in chronological order.
    /// The window is selected newest-first and reversed; `limit <= 0`
    /// loads the whole conversation.
    pub async fn load(
        &self,
        user_id: &str,
        document_id: &str,
        limit: i64,
    ) -> Result<Vec<StoredMessage>, PipelineError> {
        check_conversation_key(user_id, document_id)?;

        let rows = if limit > 0 {
            sqlx::query(
                "SELECT * FROM (
                    SELECT * FROM messages
                    WHERE user_id = ? AND document_id = ?
                    ORDER BY id DESC LIMIT ?
                ) ORDER BY id ASC",
            )
            .bind(user_id)
            .bind(document_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(PipelineError::history)?
        } else {
            sqlx::query(
                "SELECT * FROM messages
                 WHERE user_id = ? AND document_id = ?
                 ORDER BY id ASC",
            )
            .bind(user_id)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await
            .map_err(PipelineError::history)?
        };

        let mut messages = Vec::new();
        for row in rows {
            let role: String = row.try_get("role").unwrap_or_default();
            messages.push(StoredMessage {
                id: row.try_get::<i64, _>("id").unwrap_or_default(),
                role: ChatRole::from_db(&role),
                content: row.try_get::<String, _>("content").unwrap_or_default(),
                created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
            });
        }

        Ok(messages)
    }

    /// Number of questions asked so far in one conversation.
    pub async fn count_questions(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<i64, PipelineError> {
        check_conversation_key(user_id, document_id)?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages
             WHERE user_id = ? AND document_id = ? AND role = 'human'",
        )
        .bind(user_id)
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(PipelineError::history)?;

        Ok(count)
    }

    pub async fn delete_conversation(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<u64, PipelineError> {
        check_conversation_key(user_id, document_id)?;

        let result = sqlx::query("DELETE FROM messages WHERE user_id = ? AND document_id = ?")
            .bind(user_id)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(PipelineError::history)?;

        Ok(result.rows_affected())
    }

    pub async fn count_messages(&self) -> Result<usize, PipelineError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await
            .map_err(PipelineError::history)?;

        Ok(count as usize)
    }
}

fn check_conversation_key(user_id: &str, document_id: &str) -> Result<(), PipelineError> {
    if user_id.trim().is_empty() || document_id.trim().is_empty() {
        return Err(PipelineError::history("conversation key is blank"));
    }
    Ok(())
}
