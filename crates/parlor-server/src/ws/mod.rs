//! WebSocket transport: wire events, connection state, and room broadcasting.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `events` | Wire protocol — tagged client/server event enums |
//! | `connection` | Per-connection outbound channel + room membership |
//! | `rooms` | Fan-out registry: session rooms, the admin room, slow-client eviction |
//! | `handler` | `/ws` upgrade, read/write loops, event dispatch |
//!
//! ## Data Flow
//!
//! `handler` parses frames into [`events::ClientEvent`] and dispatches:
//! membership events mutate the connection's own state, everything else goes
//! through the relay, which broadcasts [`events::ServerEvent`]s via `rooms`.

pub mod connection;
pub mod events;
pub mod handler;
pub mod rooms;
