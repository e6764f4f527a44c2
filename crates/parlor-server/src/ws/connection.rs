//! Per-connection state: outbound channel and room membership.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use super::events::ServerEvent;

/// Room membership, rebuilt from explicit join events on every (re)connect.
///
/// A user-side connection sits in at most one session room. An admin-side
/// connection sits in the admin room plus the session rooms it is currently
/// watching. The whole set vanishes with the connection.
#[derive(Debug, Default)]
struct Membership {
    /// Session room for user-role traffic (`join` replaces any previous one).
    session: Option<String>,
    /// Whether this connection joined the admin room.
    is_admin: bool,
    /// Session rooms an admin connection is watching.
    watched: HashSet<String>,
}

/// A connected WebSocket client.
///
/// Holds the sending half of the outbound channel; the receiving half is
/// drained by the connection's writer task. Sends never block — when the
/// channel is full the frame is dropped and counted, and the room registry
/// evicts the client once drops pass its threshold.
pub struct ClientConnection {
    /// Unique connection id (`conn_` prefix).
    pub id: String,
    tx: mpsc::Sender<Arc<String>>,
    dropped: AtomicU64,
    membership: Mutex<Membership>,
}

impl ClientConnection {
    /// Create a connection wrapping the given outbound channel.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            dropped: AtomicU64::new(0),
            membership: Mutex::new(Membership::default()),
        }
    }

    /// Queue a serialized frame. Returns `false` (and counts a drop) when
    /// the client's channel is full or closed.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Serialize one event and queue it for this connection only.
    ///
    /// Used for targeted emits: the join-time greeting and error frames.
    pub fn send_event(&self, event: &ServerEvent) -> bool {
        match serde_json::to_string(event) {
            Ok(json) => self.send(Arc::new(json)),
            Err(e) => {
                warn!(conn_id = %self.id, event = event.name(), error = %e, "failed to serialize event");
                false
            }
        }
    }

    /// Total frames dropped on this connection's channel.
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Subscribe to a session room, replacing any previous subscription.
    pub fn join_session(&self, session_id: &str) {
        let mut m = self.membership.lock();
        m.session = Some(session_id.to_string());
    }

    /// Subscribe to the admin room.
    pub fn join_admin(&self) {
        let mut m = self.membership.lock();
        m.is_admin = true;
    }

    /// Additionally watch a session's room. No-op unless the connection has
    /// joined the admin room first; returns whether the watch took effect.
    pub fn watch_session(&self, session_id: &str) -> bool {
        let mut m = self.membership.lock();
        if !m.is_admin {
            return false;
        }
        let _ = m.watched.insert(session_id.to_string());
        true
    }

    /// Session this connection joined as a user, if any.
    pub fn session_id(&self) -> Option<String> {
        self.membership.lock().session.clone()
    }

    /// Whether this connection is in the admin room.
    pub fn is_admin(&self) -> bool {
        self.membership.lock().is_admin
    }

    /// Whether this connection is in the given session's room, either as
    /// the joined user or as a watching admin.
    pub fn in_session_room(&self, session_id: &str) -> bool {
        let m = self.membership.lock();
        m.session.as_deref() == Some(session_id) || m.watched.contains(session_id)
    }
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("id", &self.id)
            .field("dropped", &self.drop_count())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
