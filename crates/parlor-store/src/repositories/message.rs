//! Message repository — append and query over the `messages` table.
//!
//! Messages are immutable once inserted. Within a session they are totally
//! ordered by `(created_at, id)`; every read query returns that order.

use parlor_core::role::SenderRole;
use rusqlite::{Connection, Row, params};

use crate::errors::Result;
use crate::row_types::{MessageRow, NewMessage, SessionSummary};

/// Message repository — stateless, every method takes `&Connection`.
pub struct MessageRepo;

impl MessageRepo {
    /// Insert a message and return the persisted row.
    ///
    /// The server assigns `created_at` (now, RFC 3339 UTC) and `id`
    /// (`AUTOINCREMENT`); everything else is taken from `msg` verbatim.
    pub fn insert(conn: &Connection, msg: &NewMessage<'_>) -> Result<MessageRow> {
        let created_at = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO messages
                (session_id, sender_role, text, image_data, display_name, reply_to, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                msg.session_id,
                msg.sender_role.as_str(),
                msg.text,
                msg.image_data,
                msg.display_name,
                msg.reply_to,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(MessageRow {
            id,
            session_id: msg.session_id.to_string(),
            sender_role: msg.sender_role,
            text: msg.text.to_string(),
            image_data: msg.image_data.map(String::from),
            display_name: msg.display_name.map(String::from),
            reply_to: msg.reply_to.map(String::from),
            created_at,
        })
    }

    /// List a session's messages in creation order.
    pub fn list_for_session(conn: &Connection, session_id: &str) -> Result<Vec<MessageRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, session_id, sender_role, text, image_data, display_name, reply_to, created_at
             FROM messages WHERE session_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![session_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count a session's messages.
    pub fn count_for_session(conn: &Connection, session_id: &str) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a session's entire transcript. Returns the number of rows removed.
    pub fn delete_for_session(conn: &Connection, session_id: &str) -> Result<u64> {
        let deleted = conn.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(deleted as u64)
    }

    /// List sessions by most recent message, newest first.
    ///
    /// `display_name` is the most recent non-null display name seen on the
    /// session's messages (the admin console labels conversations with it).
    pub fn list_sessions(conn: &Connection) -> Result<Vec<SessionSummary>> {
        let mut stmt = conn.prepare(
            "SELECT m.session_id,
                    MAX(m.created_at) AS last_message,
                    (SELECT display_name FROM messages
                      WHERE session_id = m.session_id AND display_name IS NOT NULL
                      ORDER BY created_at DESC, id DESC LIMIT 1) AS display_name
             FROM messages m
             GROUP BY m.session_id
             ORDER BY last_message DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SessionSummary {
                    session_id: row.get(0)?,
                    last_message: row.get(1)?,
                    display_name: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
        let role_text: String = row.get(2)?;
        let sender_role = role_text.parse::<SenderRole>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(MessageRow {
            id: row.get(0)?,
            session_id: row.get(1)?,
            sender_role,
            text: row.get(3)?,
            image_data: row.get(4)?,
            display_name: row.get(5)?,
            reply_to: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
