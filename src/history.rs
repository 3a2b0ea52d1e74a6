//! Per-session conversation history.
//!
//! Sessions are created explicitly, messages are append-only, and each append
//! advances the session's `last_updated`. Reads return messages oldest first.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::db;
use crate::error::{LoreError, Result};

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: String,
    pub last_updated: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

/// Rows removed by [`ConversationLog::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetCounts {
    pub messages: usize,
    pub sessions: usize,
}

pub struct ConversationLog {
    conn: Connection,
}

impl ConversationLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(db::open_history_database(path)?))
    }

    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Start a session. `metadata` must be a JSON object (e.g. `{"mode": "cli"}`).
    pub fn create_session(&mut self, metadata: &serde_json::Value) -> Result<String> {
        if !metadata.is_object() {
            return Err(LoreError::validation("session metadata must be a JSON object"));
        }
        let session_id = uuid::Uuid::now_v7().to_string();
        let now = db::timestamp_now();
        self.conn.execute(
            "INSERT INTO sessions (session_id, created_at, last_updated, metadata)
             VALUES (?1, ?2, ?2, ?3)",
            params![session_id, now, serde_json::to_string(metadata)?],
        )?;

        info!(session_id = %session_id, "session created");
        Ok(session_id)
    }

    /// Append one message and advance the session's `last_updated`.
    pub fn append_message(&mut self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let now = db::timestamp_now();
        let tx = self.conn.transaction()?;

        let touched = tx.execute(
            "UPDATE sessions SET last_updated = ?2 WHERE session_id = ?1",
            params![session_id, now],
        )?;
        if touched == 0 {
            return Err(LoreError::validation(format!("unknown session: {session_id}")));
        }

        tx.execute(
            "INSERT INTO messages (session_id, role, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![session_id, role.as_str(), content, now],
        )?;
        tx.commit()?;

        debug!(session_id, role = %role, len = content.len(), "message appended");
        Ok(())
    }

    /// The most recent `limit` messages of a session, oldest first.
    pub fn history(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, role, content, timestamp FROM messages
             WHERE session_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(
                params![session_id, i64::try_from(limit).unwrap_or(i64::MAX)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut messages = rows
            .into_iter()
            .map(|(session_id, role, content, timestamp)| -> Result<Message> {
                let role = role.parse::<Role>().map_err(LoreError::Validation)?;
                Ok(Message {
                    session_id,
                    role,
                    content,
                    timestamp,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        messages.reverse();
        Ok(messages)
    }

    pub fn session(&self, session_id: &str) -> Result<Option<Session>> {
        let row = self
            .conn
            .query_row(
                "SELECT session_id, created_at, last_updated, metadata FROM sessions
                 WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(session_id, created_at, last_updated, metadata)| -> Result<Session> {
            Ok(Session {
                session_id,
                created_at,
                last_updated,
                metadata: serde_json::from_str(&metadata)?,
            })
        })
        .transpose()
    }

    pub fn message_count(&self, session_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn session_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Delete every message and session.
    pub fn reset(&mut self) -> Result<ResetCounts> {
        let tx = self.conn.transaction()?;
        let messages = tx.execute("DELETE FROM messages", [])?;
        let sessions = tx.execute("DELETE FROM sessions", [])?;
        tx.commit()?;

        info!(messages, sessions, "conversation log reset");
        Ok(ResetCounts { messages, sessions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> ConversationLog {
        ConversationLog::new(db::open_memory_history_database().unwrap())
    }

    #[test]
    fn history_keeps_most_recent_in_chronological_order() {
        let mut log = log();
        let session = log.create_session(&serde_json::json!({"mode": "test"})).unwrap();
        for i in 0..5 {
            log.append_message(&session, Role::User, &format!("m{i}")).unwrap();
        }

        let history = log.history(&session, 2).unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4"]);
    }

    #[test]
    fn append_advances_last_updated() {
        let mut log = log();
        let session = log.create_session(&serde_json::json!({})).unwrap();
        let before = log.session(&session).unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));
        log.append_message(&session, Role::Assistant, "hi").unwrap();
        let after = log.session(&session).unwrap().unwrap();

        assert_eq!(before.created_at, after.created_at);
        assert!(after.last_updated > before.last_updated);
    }

    #[test]
    fn append_to_unknown_session_fails() {
        let mut log = log();
        let err = log.append_message("nope", Role::User, "x").unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));
        assert_eq!(log.message_count("nope").unwrap(), 0);
    }

    #[test]
    fn reset_reports_counts() {
        let mut log = log();
        let a = log.create_session(&serde_json::json!({})).unwrap();
        log.create_session(&serde_json::json!({})).unwrap();
        log.append_message(&a, Role::User, "q").unwrap();
        log.append_message(&a, Role::Assistant, "r").unwrap();

        let counts = log.reset().unwrap();
        assert_eq!(counts, ResetCounts { messages: 2, sessions: 2 });
        assert_eq!(log.session_count().unwrap(), 0);
    }

    #[test]
    fn role_parses_and_rejects() {
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!("system".parse::<Role>().is_err());
    }
}
