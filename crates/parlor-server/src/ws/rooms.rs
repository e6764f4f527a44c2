//! Event fan-out to connected WebSocket clients.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::ClientConnection;
use super::events::ServerEvent;
use crate::metrics::WS_BROADCAST_DROPS_TOTAL;

/// Maximum total lifetime frame drops before forcibly disconnecting a slow client.
const MAX_TOTAL_DROPS: u64 = 100;

/// The single in-process broadcast authority.
///
/// Rooms are not materialized anywhere: membership lives on each
/// [`ClientConnection`], and a broadcast is a filtered pass over the
/// connection set.
pub struct RoomRegistry {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
    /// Atomic counter tracking total connections (avoids read-locking for count queries).
    active_count: AtomicUsize,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Add a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        if conns.insert(connection.id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove a connection by ID.
    pub async fn remove(&self, connection_id: &str) {
        let mut conns = self.connections.write().await;
        if conns.remove(connection_id).is_some() {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Broadcast an event to every connection in the given session's room,
    /// joined users and watching admins alike.
    pub async fn broadcast_to_session(&self, session_id: &str, event: &ServerEvent) {
        self.broadcast_to(|c| c.in_session_room(session_id), event, session_id)
            .await;
    }

    /// Broadcast to a session's room, skipping one connection.
    ///
    /// Used for admin typing signals, which the typist must not echo back.
    pub async fn broadcast_to_session_except(
        &self,
        session_id: &str,
        except_id: &str,
        event: &ServerEvent,
    ) {
        self.broadcast_to(
            |c| c.id != except_id && c.in_session_room(session_id),
            event,
            session_id,
        )
        .await;
    }

    /// Broadcast an event to every connection in the admin room.
    pub async fn broadcast_to_admins(&self, event: &ServerEvent) {
        self.broadcast_to(ClientConnection::is_admin, event, "admin-room")
            .await;
    }

    /// Serialize event, fan out to matching clients, remove slow clients.
    async fn broadcast_to(
        &self,
        filter: impl Fn(&ClientConnection) -> bool,
        event: &ServerEvent,
        label: &str,
    ) {
        let json = match serde_json::to_string(event) {
            Ok(j) => Arc::new(j),
            Err(e) => {
                warn!(event = event.name(), error = %e, "failed to serialize event");
                return;
            }
        };
        let mut to_remove = Vec::new();
        {
            let conns = self.connections.read().await;
            let mut recipients = 0u32;
            for conn in conns.values() {
                if filter(conn) {
                    recipients += 1;
                    if !conn.send(Arc::clone(&json)) {
                        counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                        let drops = conn.drop_count();
                        if drops >= MAX_TOTAL_DROPS {
                            warn!(conn_id = %conn.id, label, drops, "disconnecting slow client");
                            to_remove.push(conn.id.clone());
                        } else {
                            warn!(conn_id = %conn.id, label, total_drops = drops, "failed to send event to client (channel full)");
                        }
                    }
                }
            }
            debug!(event = event.name(), label, recipients, "broadcast event");
        }
        if !to_remove.is_empty() {
            let mut conns = self.connections.write().await;
            for id in &to_remove {
                if conns.remove(id).is_some() {
                    let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Connections currently in the given session's room.
    pub async fn session_connections(&self, session_id: &str) -> Vec<Arc<ClientConnection>> {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|c| c.in_session_room(session_id))
            .cloned()
            .collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_connection_with_rx(
        id: &str,
        session: Option<&str>,
    ) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(32);
        let conn = ClientConnection::new(id.into(), tx);
        if let Some(sid) = session {
            conn.join_session(sid);
        }
        (Arc::new(conn), rx)
    }

    fn make_admin_with_rx(id: &str) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(32);
        let conn = ClientConnection::new(id.into(), tx);
        conn.join_admin();
        (Arc::new(conn), rx)
    }

    fn make_event() -> ServerEvent {
        ServerEvent::error("test failure")
    }

    #[tokio::test]
    async fn add_connection() {
        let rooms = RoomRegistry::new();
        let (conn, _rx) = make_connection_with_rx("c1", None);
        rooms.add(conn).await;
        assert_eq!(rooms.connection_count(), 1);
    }

    #[tokio::test]
    async fn remove_connection() {
        let rooms = RoomRegistry::new();
        let (conn, _rx) = make_connection_with_rx("c1", None);
        rooms.add(conn).await;
        rooms.remove("c1").await;
        assert_eq!(rooms.connection_count(), 0);
    }

    #[tokio::test]
    async fn remove_nonexistent_connection() {
        let rooms = RoomRegistry::new();
        rooms.remove("no_such").await;
        assert_eq!(rooms.connection_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_to_session() {
        let rooms = RoomRegistry::new();
        let (conn1, mut rx1) = make_connection_with_rx("c1", Some("sess_a"));
        let (conn2, mut rx2) = make_connection_with_rx("c2", Some("sess_b"));
        let (conn3, mut rx3) = make_connection_with_rx("c3", Some("sess_a"));
        rooms.add(conn1).await;
        rooms.add(conn2).await;
        rooms.add(conn3).await;

        rooms.broadcast_to_session("sess_a", &make_event()).await;

        // conn1 and conn3 should receive, conn2 should not
        assert!(rx1.try_recv().is_ok());
        assert!(rx3.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn watching_admin_receives_session_broadcast() {
        let rooms = RoomRegistry::new();
        let (user, mut user_rx) = make_connection_with_rx("c1", Some("sess_a"));
        let (admin, mut admin_rx) = make_admin_with_rx("a1");
        assert!(admin.watch_session("sess_a"));
        rooms.add(user).await;
        rooms.add(admin).await;

        rooms.broadcast_to_session("sess_a", &make_event()).await;

        assert!(user_rx.try_recv().is_ok());
        assert!(admin_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn non_watching_admin_skipped_by_session_broadcast() {
        let rooms = RoomRegistry::new();
        let (admin, mut admin_rx) = make_admin_with_rx("a1");
        rooms.add(admin).await;

        rooms.broadcast_to_session("sess_a", &make_event()).await;

        assert!(admin_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_to_admins_targets_admin_room_only() {
        let rooms = RoomRegistry::new();
        let (user, mut user_rx) = make_connection_with_rx("c1", Some("sess_a"));
        let (admin1, mut admin1_rx) = make_admin_with_rx("a1");
        let (admin2, mut admin2_rx) = make_admin_with_rx("a2");
        rooms.add(user).await;
        rooms.add(admin1).await;
        rooms.add(admin2).await;

        rooms.broadcast_to_admins(&make_event()).await;

        assert!(admin1_rx.try_recv().is_ok());
        assert!(admin2_rx.try_recv().is_ok());
        assert!(user_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn except_skips_the_sender() {
        let rooms = RoomRegistry::new();
        let (user, mut user_rx) = make_connection_with_rx("c1", Some("sess_a"));
        let (admin, mut admin_rx) = make_admin_with_rx("a1");
        assert!(admin.watch_session("sess_a"));
        rooms.add(user).await;
        rooms.add(admin.clone()).await;

        rooms
            .broadcast_to_session_except("sess_a", &admin.id, &ServerEvent::AdminTyping(true))
            .await;

        assert!(user_rx.try_recv().is_ok());
        assert!(admin_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn connection_count() {
        let rooms = RoomRegistry::new();
        assert_eq!(rooms.connection_count(), 0);

        let (c1, _rx1) = make_connection_with_rx("c1", None);
        let (c2, _rx2) = make_connection_with_rx("c2", None);
        rooms.add(c1).await;
        assert_eq!(rooms.connection_count(), 1);
        rooms.add(c2).await;
        assert_eq!(rooms.connection_count(), 2);
        rooms.remove("c1").await;
        assert_eq!(rooms.connection_count(), 1);
    }

    #[tokio::test]
    async fn session_connections() {
        let rooms = RoomRegistry::new();
        let (c1, _rx1) = make_connection_with_rx("c1", Some("sess_a"));
        let (c2, _rx2) = make_connection_with_rx("c2", Some("sess_b"));
        let (c3, _rx3) = make_connection_with_rx("c3", Some("sess_a"));
        rooms.add(c1).await;
        rooms.add(c2).await;
        rooms.add(c3).await;

        let sess_a = rooms.session_connections("sess_a").await;
        assert_eq!(sess_a.len(), 2);

        let sess_b = rooms.session_connections("sess_b").await;
        assert_eq!(sess_b.len(), 1);
    }

    #[tokio::test]
    async fn session_connections_empty_session() {
        let rooms = RoomRegistry::new();
        let (c1, _rx1) = make_connection_with_rx("c1", Some("sess_a"));
        rooms.add(c1).await;

        let conns = rooms.session_connections("nonexistent").await;
        assert!(conns.is_empty());
    }

    #[tokio::test]
    async fn broadcast_to_empty_session() {
        let rooms = RoomRegistry::new();
        // Should not panic
        rooms.broadcast_to_session("no_session", &make_event()).await;
    }

    #[tokio::test]
    async fn broadcast_to_admins_with_no_admins() {
        let rooms = RoomRegistry::new();
        // Should not panic
        rooms.broadcast_to_admins(&make_event()).await;
    }

    #[tokio::test]
    async fn broadcast_event_is_valid_json() {
        let rooms = RoomRegistry::new();
        let (conn, mut rx) = make_connection_with_rx("c1", Some("sess_a"));
        rooms.add(conn).await;

        rooms
            .broadcast_to_session("sess_a", &ServerEvent::error("boom"))
            .await;

        let frame = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["event"], "error");
        assert_eq!(parsed["data"]["message"], "boom");
    }

    #[tokio::test]
    async fn add_connection_overwrites_same_id() {
        let rooms = RoomRegistry::new();
        let (c1, _rx1) = make_connection_with_rx("same_id", Some("sess_a"));
        let (c2, _rx2) = make_connection_with_rx("same_id", Some("sess_b"));
        rooms.add(c1).await;
        rooms.add(c2).await;
        assert_eq!(rooms.connection_count(), 1);
        // Should be the second connection (sess_b)
        let conns = rooms.session_connections("sess_b").await;
        assert_eq!(conns.len(), 1);
    }

    #[tokio::test]
    async fn unjoined_connections_not_in_session_broadcast() {
        let rooms = RoomRegistry::new();
        let (c1, mut rx1) = make_connection_with_rx("c1", None); // never joined
        let (c2, mut rx2) = make_connection_with_rx("c2", Some("sess_a"));
        rooms.add(c1).await;
        rooms.add(c2).await;

        rooms.broadcast_to_session("sess_a", &make_event()).await;

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn default_registry_is_empty() {
        let rooms = RoomRegistry::default();
        assert_eq!(rooms.connection_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_disconnects_slow_client_after_threshold() {
        let rooms = RoomRegistry::new();
        // Create a slow client with buffer of 1
        let (tx, _rx) = mpsc::channel(1);
        let slow_conn = Arc::new(ClientConnection::new("slow".into(), tx));
        slow_conn.join_session("s");

        // Create a fast client with large buffer
        let (fast_conn, mut fast_rx) = make_connection_with_rx("fast", Some("s"));

        rooms.add(slow_conn.clone()).await;
        rooms.add(fast_conn).await;

        let event = make_event();
        // First send fills the buffer
        rooms.broadcast_to_session("s", &event).await;
        // Now send MAX_TOTAL_DROPS more to exceed the threshold
        for _ in 0..MAX_TOTAL_DROPS {
            rooms.broadcast_to_session("s", &event).await;
        }

        // Slow client should have been disconnected
        assert_eq!(rooms.connection_count(), 1);
        // Fast client should still be connected and received all messages
        assert!(fast_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_keeps_fast_client() {
        let rooms = RoomRegistry::new();
        let (fast, mut rx) = make_connection_with_rx("fast", Some("s"));
        rooms.add(fast).await;

        let event = make_event();
        for _ in 0..20 {
            rooms.broadcast_to_session("s", &event).await;
            // Drain to keep channel clear (simulating a fast client)
            while rx.try_recv().is_ok() {}
        }

        // Fast client should still be connected
        assert_eq!(rooms.connection_count(), 1);
    }

    #[test]
    fn slow_client_threshold_constant_value() {
        assert_eq!(MAX_TOTAL_DROPS, 100);
    }

    #[tokio::test]
    async fn connection_count_consistent_after_add_remove_overwrite() {
        let rooms = RoomRegistry::new();
        let (c1, _rx1) = make_connection_with_rx("c1", None);
        let (c2, _rx2) = make_connection_with_rx("c2", None);
        let (c1_dup, _rx3) = make_connection_with_rx("c1", Some("s"));
        rooms.add(c1).await;
        rooms.add(c2).await;
        // Overwrite c1 — count should stay 2
        rooms.add(c1_dup).await;
        assert_eq!(rooms.connection_count(), 2);
        rooms.remove("c1").await;
        assert_eq!(rooms.connection_count(), 1);
        rooms.remove("c2").await;
        assert_eq!(rooms.connection_count(), 0);
    }

    #[tokio::test]
    async fn connection_count_decremented_on_slow_client_removal() {
        let rooms = RoomRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        let slow = Arc::new(ClientConnection::new("slow".into(), tx));
        slow.join_session("s");
        let (fast, _fast_rx) = make_connection_with_rx("fast", Some("s"));
        rooms.add(slow).await;
        rooms.add(fast).await;
        assert_eq!(rooms.connection_count(), 2);

        let event = make_event();
        // Fill channel + exceed threshold
        for _ in 0..=MAX_TOTAL_DROPS {
            rooms.broadcast_to_session("s", &event).await;
        }
        // Slow client removed, count decremented
        assert_eq!(rooms.connection_count(), 1);
    }

    #[tokio::test]
    async fn admin_broadcast_disconnects_slow_admin() {
        let rooms = RoomRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        let slow = Arc::new(ClientConnection::new("slow".into(), tx));
        slow.join_admin();
        let (fast, mut fast_rx) = make_admin_with_rx("fast");
        rooms.add(slow).await;
        rooms.add(fast).await;

        let event = make_event();
        // First send fills the slow admin's buffer
        rooms.broadcast_to_admins(&event).await;
        // Exceed threshold
        for _ in 0..MAX_TOTAL_DROPS {
            rooms.broadcast_to_admins(&event).await;
        }
        assert_eq!(rooms.connection_count(), 1);
        assert!(fast_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn slow_client_in_other_session_unaffected() {
        let rooms = RoomRegistry::new();
        // Slow client in session A
        let (tx, _rx) = mpsc::channel(1);
        let slow_a = Arc::new(ClientConnection::new("slow_a".into(), tx));
        slow_a.join_session("a");
        // Fast client in session B
        let (fast_b, _fast_rx) = make_connection_with_rx("fast_b", Some("b"));
        rooms.add(slow_a).await;
        rooms.add(fast_b).await;

        let event = make_event();
        rooms.broadcast_to_session("a", &event).await;
        for _ in 0..MAX_TOTAL_DROPS {
            rooms.broadcast_to_session("a", &event).await;
        }
        // Slow client in A removed, B unaffected
        assert_eq!(rooms.connection_count(), 1);
        let b_conns = rooms.session_connections("b").await;
        assert_eq!(b_conns.len(), 1);
    }

    #[tokio::test]
    async fn broadcast_arc_shared_not_cloned() {
        let rooms = RoomRegistry::new();
        let (c1, mut rx1) = make_connection_with_rx("c1", Some("s"));
        let (c2, mut rx2) = make_connection_with_rx("c2", Some("s"));
        rooms.add(c1).await;
        rooms.add(c2).await;

        rooms.broadcast_to_session("s", &make_event()).await;

        let msg1 = rx1.recv().await.unwrap();
        let msg2 = rx2.recv().await.unwrap();
        // Both receivers share the same Arc — same pointer, refcount == 2
        assert!(Arc::ptr_eq(&msg1, &msg2));
        assert_eq!(Arc::strong_count(&msg1), 2);
        // Content is identical
        assert_eq!(&*msg1, &*msg2);
        // After dropping one, the other becomes sole owner
        drop(msg2);
        assert_eq!(Arc::strong_count(&msg1), 1);
    }
}
