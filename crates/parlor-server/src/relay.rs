//! The relay core: greeting policy, store-then-broadcast message routing,
//! and transient typing forwarding.
//!
//! Every send is strictly ordered: nothing is broadcast before the store
//! confirms the write, so a client that receives a `message` frame can rely
//! on it being durable. Store failures surface to the sender only, as an
//! `error` frame, and never produce a partial broadcast.

use std::sync::Arc;

use metrics::counter;
use parlor_core::role::SenderRole;
use parlor_store::{ChatStore, NewMessage};
use tracing::{debug, info, instrument, warn};

use crate::metrics::{RELAY_GREETINGS_TOTAL, RELAY_MESSAGES_TOTAL};
use crate::push::PushNotifier;
use crate::ws::connection::ClientConnection;
use crate::ws::events::{
    AdminTypingPayload, JoinPayload, NewUserMessagePayload, SendMessagePayload, ServerEvent,
    UserTypingPayload,
};
use crate::ws::rooms::RoomRegistry;

/// Fixed greeting injected on a session's first join, authored as `admin`.
pub const GREETING_TEXT: &str = "Hello, how can I help you?";

/// Error frame text for a failed persist, greeting or regular send alike.
pub const SEND_ERROR_TEXT: &str = "Failed to send message";

/// Routes inbound events to the store and the right broadcast scope.
pub struct Relay {
    store: Arc<ChatStore>,
    rooms: Arc<RoomRegistry>,
    notifier: Arc<PushNotifier>,
}

impl Relay {
    /// Create a relay over the given store, room registry, and dispatcher.
    pub fn new(store: Arc<ChatStore>, rooms: Arc<RoomRegistry>, notifier: Arc<PushNotifier>) -> Self {
        Self {
            store,
            rooms,
            notifier,
        }
    }

    /// Subscribe a connection to its session room and apply the greeting
    /// policy: if the session has zero persisted messages, persist one fixed
    /// admin greeting and emit it to the joining connection only.
    ///
    /// The zero-message check and the insert are not atomic: two racing
    /// first joins can both observe an empty session and both insert a
    /// greeting. Accepted as a rare duplicate admin message rather than
    /// serializing joins through a lock.
    #[instrument(skip(self, conn, payload), fields(conn_id = %conn.id, session_id = %payload.session_id))]
    pub async fn join(&self, conn: &Arc<ClientConnection>, payload: JoinPayload) {
        conn.join_session(&payload.session_id);
        info!("user joined session");

        match self.store.has_messages(&payload.session_id) {
            Ok(true) => {}
            Ok(false) => self.inject_greeting(conn, &payload),
            Err(e) => {
                warn!(error = %e, "greeting check failed");
                let _ = conn.send_event(&ServerEvent::error(SEND_ERROR_TEXT));
            }
        }
    }

    fn inject_greeting(&self, conn: &Arc<ClientConnection>, payload: &JoinPayload) {
        let greeting = NewMessage {
            session_id: &payload.session_id,
            sender_role: SenderRole::Admin,
            text: GREETING_TEXT,
            image_data: None,
            display_name: payload.display_name.as_deref(),
            reply_to: None,
        };
        match self.store.append_message(&greeting) {
            Ok(row) => {
                counter!(RELAY_GREETINGS_TOTAL).increment(1);
                debug!(message_id = row.id, "greeting injected");
                // No one else is subscribed yet; emit to the joiner only.
                let _ = conn.send_event(&ServerEvent::Message(row));
            }
            Err(e) => {
                warn!(error = %e, "failed to persist greeting");
                let _ = conn.send_event(&ServerEvent::error(SEND_ERROR_TEXT));
            }
        }
    }

    /// Persist a message, broadcast it to its session's room, and fan out
    /// the role-specific side effects.
    ///
    /// A `user` send additionally notifies the admin room with a
    /// `new-user-message` envelope. An `admin` send additionally triggers
    /// the push dispatcher, asynchronously — its outcome cannot alter the
    /// result already decided here.
    #[instrument(skip(self, conn, payload), fields(conn_id = %conn.id, session_id = %payload.session_id, role = %payload.sender_role))]
    pub async fn send_message(&self, conn: &Arc<ClientConnection>, payload: SendMessagePayload) {
        let msg = NewMessage {
            session_id: &payload.session_id,
            sender_role: payload.sender_role,
            text: &payload.text,
            image_data: payload.image_data.as_deref(),
            display_name: payload.display_name.as_deref(),
            reply_to: payload.reply_to_text.as_deref(),
        };
        let row = match self.store.append_message(&msg) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "failed to persist message");
                let _ = conn.send_event(&ServerEvent::error(SEND_ERROR_TEXT));
                return;
            }
        };
        counter!(RELAY_MESSAGES_TOTAL, "role" => row.sender_role.as_str()).increment(1);

        // Broadcast only after the store confirmed: received implies durable.
        // The sender's own connection is included, confirming persistence.
        self.rooms
            .broadcast_to_session(&row.session_id, &ServerEvent::Message(row.clone()))
            .await;

        match row.sender_role {
            SenderRole::User => {
                let envelope = ServerEvent::NewUserMessage(NewUserMessagePayload {
                    session_id: row.session_id.clone(),
                    message: row,
                });
                self.rooms.broadcast_to_admins(&envelope).await;
            }
            SenderRole::Admin => {
                let notifier = Arc::clone(&self.notifier);
                let has_image = row.image_data.is_some();
                drop(tokio::spawn(async move {
                    notifier.notify(&row.session_id, &row.text, has_image).await;
                }));
            }
        }
    }

    /// Forward a user's typing state to the admin room. Never persisted.
    pub async fn user_typing(&self, payload: UserTypingPayload) {
        self.rooms
            .broadcast_to_admins(&ServerEvent::UserTyping(payload))
            .await;
    }

    /// Forward the admin's typing state to the target session's room,
    /// excluding the typing connection itself. Never persisted.
    pub async fn admin_typing(&self, conn: &Arc<ClientConnection>, payload: AdminTypingPayload) {
        self.rooms
            .broadcast_to_session_except(
                &payload.target_session_id,
                &conn.id,
                &ServerEvent::AdminTyping(payload.is_typing),
            )
            .await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
