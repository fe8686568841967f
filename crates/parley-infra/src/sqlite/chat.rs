//! SQLite chat store implementation.
//!
//! Implements `ChatStore` from `parley-core` using sqlx with split read/write
//! pools: raw queries, private Row structs, reads on the reader pool and
//! writes on the single-connection writer pool.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use parley_core::chat::store::ChatStore;
use parley_types::chat::{Chat, ChatId, Message, MessageId, canonical_pair};
use parley_types::error::StoreError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatStore`.
pub struct SqliteChatStore {
    pool: DatabasePool,
}

impl SqliteChatStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Chat.
struct ChatRow {
    id: String,
    user_id1: String,
    user_id2: String,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id1: row.try_get("user_id1")?,
            user_id2: row.try_get("user_id2")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chat(self) -> Result<Chat, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Unavailable(format!("invalid chat id: {e}")))?;

        Ok(Chat {
            id: ChatId(id),
            user_id1: self.user_id1,
            user_id2: self.user_id2,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Message.
struct MessageRow {
    id: String,
    chat_id: String,
    sender_id: String,
    content: String,
    created_at: String,
    read_at: Option<String>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            sender_id: row.try_get("sender_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            read_at: row.try_get("read_at")?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Unavailable(format!("invalid message id: {e}")))?;
        let chat_id = Uuid::parse_str(&self.chat_id)
            .map_err(|e| StoreError::Unavailable(format!("invalid chat_id: {e}")))?;
        let read_at = self.read_at.as_deref().map(parse_datetime).transpose()?;

        Ok(Message {
            id: MessageId(id),
            chat_id: ChatId(chat_id),
            sender_id: self.sender_id,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
            read_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Unavailable(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that text order in SQLite is chronological order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision that survives a round trip through the table.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Map a sqlx error onto the store taxonomy.
///
/// `missing` names the referenced entity reported when a foreign key fails.
fn map_sqlx_error(e: sqlx::Error, missing: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
            StoreError::Validation(db_err.message().to_string())
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::NotFound(missing.to_string())
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(missing.to_string()),
        _ => StoreError::Unavailable(e.to_string()),
    }
}

fn rows_to_chats(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Chat>, StoreError> {
    let mut chats = Vec::with_capacity(rows.len());
    for row in rows {
        let chat_row =
            ChatRow::from_row(row).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        chats.push(chat_row.into_chat()?);
    }
    Ok(chats)
}

// ---------------------------------------------------------------------------
// ChatStore implementation
// ---------------------------------------------------------------------------

impl ChatStore for SqliteChatStore {
    async fn create_chat(&self, user_a: &str, user_b: &str) -> Result<Chat, StoreError> {
        if user_a == user_b {
            return Err(StoreError::Validation(
                "a chat needs two distinct participants".to_string(),
            ));
        }

        let (user_id1, user_id2) = canonical_pair(user_a, user_b);
        let now = format_datetime(&now());

        // A concurrent creator for the same pair lands on the conflict arm and
        // gets the surviving row back.
        let row = sqlx::query(
            r#"INSERT INTO chats (id, user_id1, user_id2, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (user_id1, user_id2) DO UPDATE SET updated_at = excluded.updated_at
               RETURNING id, user_id1, user_id2, created_at, updated_at"#,
        )
        .bind(ChatId::new().to_string())
        .bind(user_id1)
        .bind(user_id2)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| map_sqlx_error(e, "chat"))?;

        ChatRow::from_row(&row)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .into_chat()
    }

    async fn get_chat_by_id(&self, id: &ChatId) -> Result<Chat, StoreError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound("chat".to_string()))?;

        ChatRow::from_row(&row)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .into_chat()
    }

    async fn get_chat_by_participants(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Chat, StoreError> {
        let (user_id1, user_id2) = canonical_pair(user_a, user_b);

        let row = sqlx::query("SELECT * FROM chats WHERE user_id1 = ? AND user_id2 = ?")
            .bind(user_id1)
            .bind(user_id2)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound("chat".to_string()))?;

        ChatRow::from_row(&row)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .into_chat()
    }

    async fn list_chats_for_user(&self, user_id: &str) -> Result<Vec<Chat>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM chats WHERE user_id1 = ? OR user_id2 = ? ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        rows_to_chats(&rows)
    }

    async fn create_message(
        &self,
        chat_id: &ChatId,
        sender_id: &str,
        content: &str,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: MessageId::new(),
            chat_id: *chat_id,
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            created_at: now(),
            read_at: None,
        };
        let created_at = format_datetime(&message.created_at);

        sqlx::query(
            r#"INSERT INTO messages (id, chat_id, sender_id, content, created_at, read_at)
               VALUES (?, ?, ?, ?, ?, NULL)"#,
        )
        .bind(message.id.to_string())
        .bind(chat_id.to_string())
        .bind(&message.sender_id)
        .bind(&message.content)
        .bind(&created_at)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_sqlx_error(e, "chat"))?;

        // Best effort: a stale updated_at only reorders the chat list.
        if let Err(e) = sqlx::query("UPDATE chats SET updated_at = ? WHERE id = ?")
            .bind(&created_at)
            .bind(chat_id.to_string())
            .execute(&self.pool.writer)
            .await
        {
            tracing::warn!(
                chat_id = %chat_id,
                message_id = %message.id,
                error = %e,
                "Failed to touch chat after message insert"
            );
        }

        Ok(message)
    }

    async fn list_messages(
        &self,
        chat_id: &ChatId,
        limit: u32,
        before: Option<&MessageId>,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = match before {
            Some(cursor_id) => {
                let cursor = sqlx::query(
                    "SELECT created_at, id FROM messages WHERE id = ? AND chat_id = ?",
                )
                .bind(cursor_id.to_string())
                .bind(chat_id.to_string())
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .ok_or_else(|| StoreError::NotFound("cursor message".to_string()))?;

                let cursor_created_at: String = cursor
                    .try_get("created_at")
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                let cursor_id: String = cursor
                    .try_get("id")
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;

                sqlx::query(
                    r#"SELECT * FROM messages
                       WHERE chat_id = ?
                         AND (created_at < ? OR (created_at = ? AND id < ?))
                       ORDER BY created_at DESC, id DESC
                       LIMIT ?"#,
                )
                .bind(chat_id.to_string())
                .bind(&cursor_created_at)
                .bind(&cursor_created_at)
                .bind(&cursor_id)
                .bind(i64::from(limit))
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM messages WHERE chat_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
                )
                .bind(chat_id.to_string())
                .bind(i64::from(limit))
                .fetch_all(&self.pool.reader)
                .await
            }
        }
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows.iter().rev() {
            let msg_row =
                MessageRow::from_row(row).map_err(|e| StoreError::Unavailable(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn mark_messages_read(
        &self,
        chat_id: &ChatId,
        reader_id: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"UPDATE messages SET read_at = ?
               WHERE chat_id = ? AND sender_id != ? AND read_at IS NULL"#,
        )
        .bind(format_datetime(&now()))
        .bind(chat_id.to_string())
        .bind(reader_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
