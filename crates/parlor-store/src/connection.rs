//! `SQLite` connection pooling.
//!
//! Every pooled connection runs the same pragma set on checkout init:
//! WAL journaling, NORMAL synchronous, foreign keys, and a 5s busy timeout
//! so concurrent writers wait instead of failing with `SQLITE_BUSY`.

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use uuid::Uuid;

use crate::errors::Result;

/// A pool of `SQLite` connections over one database.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// A connection checked out of the pool.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Pool sizing and checkout timeout settings.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum number of connections held by the pool.
    pub max_size: u32,
    /// How long `get()` waits for a free connection before erroring.
    pub connection_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_size: 8,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

fn apply_pragmas(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )
}

/// Open a file-backed pool at `path`.
pub fn new_file(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path).with_init(apply_pragmas);
    build_pool(manager, config)
}

/// Open an in-memory pool.
///
/// Backed by a uniquely named shared-cache database so every pooled
/// connection sees the same data. A plain `:memory:` manager would hand
/// each connection its own private database.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    let uri = format!(
        "file:parlor_mem_{}?mode=memory&cache=shared",
        Uuid::now_v7().simple()
    );
    let manager = SqliteConnectionManager::file(uri)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_init(apply_pragmas);
    build_pool(manager, config)
}

fn build_pool(manager: SqliteConnectionManager, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let pool = Pool::builder()
        .max_size(config.max_size)
        .connection_timeout(config.connection_timeout)
        .build(manager)?;
    Ok(pool)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
