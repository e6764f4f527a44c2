//! Store error types.

/// Errors surfaced by the store layer.
///
/// Persistence failures abort the operation they occur in and propagate to
/// the originating caller; they are never partially applied (multi-table
/// writes are transactional).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `SQLite`-level failure (query, constraint, conversion).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool exhausted or unable to open a connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
