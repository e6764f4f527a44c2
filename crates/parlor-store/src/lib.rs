//! # parlor-store
//!
//! `SQLite`-backed persistence for the parlor chat relay.
//!
//! Two tables: `messages` (append-only session transcripts) and
//! `push_tokens` (session → device token registrations, last write wins).
//!
//! Layering follows the repository pattern:
//!
//! - [`connection`]: r2d2 connection pooling (`new_file` / `new_in_memory`)
//! - [`migrations`]: idempotent schema bootstrap
//! - [`repositories`]: stateless per-table CRUD, every method takes `&Connection`
//! - [`store::ChatStore`]: high-level API over the pool; multi-table writes
//!   run inside a single transaction
//!
//! ## Crate Position
//!
//! Depends on `parlor-core`. Depended on by `parlor-server` and the binary.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repositories;
pub mod row_types;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
pub use errors::{Result, StoreError};
pub use migrations::run_migrations;
pub use row_types::{MessageRow, NewMessage, PushTokenRow, SessionSummary};
pub use store::ChatStore;
