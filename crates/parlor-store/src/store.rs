//! High-level [`ChatStore`] API over the connection pool.
//!
//! Single-table operations check out one connection and delegate to a
//! repository. The one multi-table write, [`ChatStore::delete_session`],
//! runs inside a single transaction so callers never observe a transcript
//! without its registration cleared (or vice versa).
//!
//! Message inserts take no app-level locks: each insert is independent, and
//! ordering within a session comes from the store-assigned `(created_at, id)`
//! pair. Writer contention is absorbed by the connections' busy timeout.

use tracing::{debug, instrument};

use crate::connection::{ConnectionPool, PooledConnection};
use crate::errors::Result;
use crate::repositories::{MessageRepo, PushTokenRepo};
use crate::row_types::{MessageRow, NewMessage, SessionSummary};

/// Pool-owning store facade used by the relay and the HTTP handlers.
pub struct ChatStore {
    pool: ConnectionPool,
}

impl ChatStore {
    /// Create a new store over the given pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────

    /// Append a message and return the persisted row.
    #[instrument(skip(self, msg), fields(session_id = msg.session_id, role = %msg.sender_role))]
    pub fn append_message(&self, msg: &NewMessage<'_>) -> Result<MessageRow> {
        let conn = self.conn()?;
        let row = MessageRepo::insert(&conn, msg)?;
        debug!(id = row.id, "message appended");
        Ok(row)
    }

    /// Whether the session has at least one persisted message.
    ///
    /// The greeting policy's single authoritative check. Not atomic with a
    /// subsequent insert — two racing first joins can both see `false`.
    pub fn has_messages(&self, session_id: &str) -> Result<bool> {
        Ok(self.count_messages(session_id)? > 0)
    }

    /// Count a session's messages.
    pub fn count_messages(&self, session_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        MessageRepo::count_for_session(&conn, session_id)
    }

    /// List a session's messages in creation order.
    pub fn list_messages(&self, session_id: &str) -> Result<Vec<MessageRow>> {
        let conn = self.conn()?;
        MessageRepo::list_for_session(&conn, session_id)
    }

    /// List sessions by most recent message, newest first.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let conn = self.conn()?;
        MessageRepo::list_sessions(&conn)
    }

    /// Delete a session's entire transcript and clear its push registration.
    ///
    /// Both removals commit atomically. Returns the number of messages
    /// deleted.
    #[instrument(skip(self))]
    pub fn delete_session(&self, session_id: &str) -> Result<u64> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let deleted = MessageRepo::delete_for_session(&tx, session_id)?;
        let token_cleared = PushTokenRepo::clear(&tx, session_id)?;
        tx.commit()?;
        debug!(deleted, token_cleared, "session deleted");
        Ok(deleted)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Push registrations
    // ─────────────────────────────────────────────────────────────────────

    /// Register or replace a session's device token (last write wins).
    #[instrument(skip(self, token), fields(session_id))]
    pub fn register_push_token(&self, session_id: &str, token: &str) -> Result<()> {
        let conn = self.conn()?;
        PushTokenRepo::upsert(&conn, session_id, token)?;
        debug!("push token registered");
        Ok(())
    }

    /// The session's most recently registered device token, if any.
    pub fn push_token(&self, session_id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        Ok(PushTokenRepo::get(&conn, session_id)?.map(|row| row.token))
    }

    /// Drop a session's registration (dead-token bookkeeping).
    /// Returns `true` if one existed.
    pub fn clear_push_token(&self, session_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        PushTokenRepo::clear(&conn, session_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
