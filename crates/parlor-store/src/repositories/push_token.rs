//! Push token repository — session → device token registrations.
//!
//! One token per session, last write wins. Decoupled from message
//! persistence: registering, reading, or clearing a token never touches the
//! transcript.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::row_types::PushTokenRow;

/// Push token repository — stateless, every method takes `&Connection`.
pub struct PushTokenRepo;

impl PushTokenRepo {
    /// Register or replace a session's device token.
    pub fn upsert(conn: &Connection, session_id: &str, token: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO push_tokens (session_id, token, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (session_id) DO UPDATE SET
                token = excluded.token,
                updated_at = excluded.updated_at",
            params![session_id, token, now],
        )?;
        Ok(())
    }

    /// Get a session's registration, if any.
    pub fn get(conn: &Connection, session_id: &str) -> Result<Option<PushTokenRow>> {
        let row = conn
            .query_row(
                "SELECT session_id, token, updated_at FROM push_tokens WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok(PushTokenRow {
                        session_id: row.get(0)?,
                        token: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Remove a session's registration. Returns `true` if one existed.
    pub fn clear(conn: &Connection, session_id: &str) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM push_tokens WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(changed > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
