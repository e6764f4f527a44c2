//! # parlor-server
//!
//! The parlor relay server: WebSocket session rooms, the store-then-broadcast
//! relay router, the admin HTTP API, and best-effort APNs push dispatch.
//!
//! Module map:
//!
//! - [`ws`]: transport layer — wire events, connection state, room fan-out
//! - [`relay`]: the business core — greeting policy, message relay, typing
//! - [`push`]: APNs service, delegate seam, and the notification dispatcher
//! - [`http`]: axum router — REST endpoints, `/ws` upgrade, health, metrics
//! - [`config`]: server configuration with environment overrides
//! - [`metrics`]: Prometheus recorder and metric name constants
//!
//! ## Crate Position
//!
//! Depends on `parlor-core` and `parlor-store`. Depended on by the `parlor`
//! binary.

#![deny(unsafe_code)]

pub mod config;
pub mod http;
pub mod metrics;
pub mod push;
pub mod relay;
pub mod ws;
