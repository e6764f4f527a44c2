//! Schema bootstrap.

use rusqlite::Connection;

use crate::errors::Result;

/// Current schema version, recorded in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

/// Create tables and indexes if the schema is older than [`SCHEMA_VERSION`].
///
/// Idempotent — safe to run on every startup and in every test setup.
///
/// `messages` is append-only: rows are never updated, and the only delete is
/// the whole-session transcript wipe. `created_at` is RFC 3339 UTC text, so
/// lexicographic order is chronological order; `id` breaks same-millisecond
/// ties.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            sender_role TEXT NOT NULL CHECK (sender_role IN ('user', 'admin')),
            text TEXT NOT NULL,
            image_data TEXT,
            display_name TEXT,
            reply_to TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_session_order
            ON messages (session_id, created_at, id);

        CREATE TABLE IF NOT EXISTS push_tokens (
            session_id TEXT PRIMARY KEY,
            token TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        PRAGMA user_version = 1;",
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
