//! Wire protocol for the `/ws` endpoint.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.
//! Event names are kebab-case; payload keys are camelCase. [`ClientEvent`]
//! covers inbound frames, [`ServerEvent`] outbound ones. An unknown event
//! name or a malformed payload fails deserialization as a whole, and the
//! handler answers with an [`ServerEvent::Error`] frame.

use parlor_core::role::SenderRole;
use parlor_store::MessageRow;
use serde::{Deserialize, Serialize};

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Subscribe this connection to a session room (user side).
    /// May trigger the first-contact greeting.
    Join(JoinPayload),
    /// Subscribe this connection to the admin room.
    AdminJoin,
    /// Admin additionally subscribes to one session's room to watch it.
    AdminSelectSession(String),
    /// Admin typing state, relayed to the target session's room.
    AdminTyping(AdminTypingPayload),
    /// User typing state, relayed to the admin room.
    UserTyping(UserTypingPayload),
    /// Persist a message and broadcast it.
    SendMessage(SendMessagePayload),
}

/// Events the server emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A persisted message, delivered to its session's room.
    Message(MessageRow),
    /// New-activity envelope for the admin room when a user sends.
    NewUserMessage(NewUserMessagePayload),
    /// User typing state, forwarded to the admin room.
    UserTyping(UserTypingPayload),
    /// Admin typing state for the watched session, as a bare boolean.
    AdminTyping(bool),
    /// Delivery or persistence failure notice for the sender.
    Error(ErrorPayload),
}

impl ServerEvent {
    /// Shorthand for an error frame.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Event name as it appears on the wire, for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::NewUserMessage(_) => "new-user-message",
            Self::UserTyping(_) => "user-typing",
            Self::AdminTyping(_) => "admin-typing",
            Self::Error(_) => "error",
        }
    }
}

/// Payload of [`ClientEvent::Join`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    /// Opaque client-supplied session id.
    pub session_id: String,
    /// Visitor's display name, attached to the greeting if one is injected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Payload of [`ClientEvent::AdminTyping`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminTypingPayload {
    /// Session whose room receives the signal.
    pub target_session_id: String,
    /// Whether the admin is currently typing.
    pub is_typing: bool,
}

/// Payload of [`ClientEvent::UserTyping`] and [`ServerEvent::UserTyping`].
///
/// Forwarded to the admin room verbatim, so one struct serves both
/// directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTypingPayload {
    /// Session the user is typing in.
    pub session_id: String,
    /// Whether the user is currently typing.
    pub is_typing: bool,
}

/// Payload of [`ClientEvent::SendMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Session the message belongs to.
    pub session_id: String,
    /// Message text. May be empty when an image is attached.
    #[serde(default)]
    pub text: String,
    /// Authoring role. Unknown strings fail deserialization.
    pub sender_role: SenderRole,
    /// Optional image payload reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    /// Optional sender display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Optional quoted-message text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_text: Option<String>,
}

/// Payload of [`ServerEvent::NewUserMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserMessagePayload {
    /// Session with new user activity.
    pub session_id: String,
    /// The persisted message.
    pub message: MessageRow,
}

/// Payload of [`ServerEvent::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable failure description.
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> MessageRow {
        MessageRow {
            id: 7,
            session_id: "S1".into(),
            sender_role: SenderRole::User,
            text: "hi".into(),
            image_data: None,
            display_name: Some("Alice".into()),
            reply_to: None,
            created_at: "2026-03-01T12:00:00+00:00".into(),
        }
    }

    #[test]
    fn join_deserializes() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event": "join", "data": {"sessionId": "S1", "displayName": "Alice"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Join(JoinPayload {
                session_id: "S1".into(),
                display_name: Some("Alice".into()),
            })
        );
    }

    #[test]
    fn join_display_name_optional() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event": "join", "data": {"sessionId": "S1"}}"#).unwrap();
        let ClientEvent::Join(payload) = event else {
            panic!("expected join");
        };
        assert!(payload.display_name.is_none());
    }

    #[test]
    fn admin_join_has_no_data() {
        let event: ClientEvent = serde_json::from_str(r#"{"event": "admin-join"}"#).unwrap();
        assert_eq!(event, ClientEvent::AdminJoin);
    }

    #[test]
    fn admin_select_session_data_is_bare_string() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event": "admin-select-session", "data": "S1"}"#).unwrap();
        assert_eq!(event, ClientEvent::AdminSelectSession("S1".into()));
    }

    #[test]
    fn send_message_deserializes_full() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event": "send-message", "data": {
                "sessionId": "S1", "text": "look", "senderRole": "user",
                "imageData": "data:image/png;base64,AAAA",
                "displayName": "Alice", "replyToText": "earlier"}}"#,
        )
        .unwrap();
        let ClientEvent::SendMessage(payload) = event else {
            panic!("expected send-message");
        };
        assert_eq!(payload.sender_role, SenderRole::User);
        assert_eq!(payload.image_data.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(payload.reply_to_text.as_deref(), Some("earlier"));
    }

    #[test]
    fn send_message_text_defaults_empty() {
        // Image-only messages omit "text" entirely.
        let event: ClientEvent = serde_json::from_str(
            r#"{"event": "send-message", "data": {
                "sessionId": "S1", "senderRole": "user",
                "imageData": "data:image/png;base64,AAAA"}}"#,
        )
        .unwrap();
        let ClientEvent::SendMessage(payload) = event else {
            panic!("expected send-message");
        };
        assert!(payload.text.is_empty());
    }

    #[test]
    fn send_message_rejects_unknown_role() {
        let result = serde_json::from_str::<ClientEvent>(
            r#"{"event": "send-message", "data": {
                "sessionId": "S1", "text": "hi", "senderRole": "bot"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_event_name_rejected() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event": "shout", "data": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn typing_events_deserialize() {
        let user: ClientEvent = serde_json::from_str(
            r#"{"event": "user-typing", "data": {"sessionId": "S1", "isTyping": true}}"#,
        )
        .unwrap();
        assert_eq!(
            user,
            ClientEvent::UserTyping(UserTypingPayload {
                session_id: "S1".into(),
                is_typing: true,
            })
        );

        let admin: ClientEvent = serde_json::from_str(
            r#"{"event": "admin-typing", "data": {"targetSessionId": "S1", "isTyping": false}}"#,
        )
        .unwrap();
        assert_eq!(
            admin,
            ClientEvent::AdminTyping(AdminTypingPayload {
                target_session_id: "S1".into(),
                is_typing: false,
            })
        );
    }

    #[test]
    fn message_event_serializes_row_verbatim() {
        let json = serde_json::to_value(ServerEvent::Message(sample_row())).unwrap();
        assert_eq!(json["event"], "message");
        assert_eq!(json["data"]["id"], 7);
        assert_eq!(json["data"]["sessionId"], "S1");
        assert_eq!(json["data"]["senderRole"], "user");
        assert_eq!(json["data"]["displayName"], "Alice");
        assert!(!json["data"].as_object().unwrap().contains_key("imageData"));
    }

    #[test]
    fn new_user_message_envelope_shape() {
        let event = ServerEvent::NewUserMessage(NewUserMessagePayload {
            session_id: "S1".into(),
            message: sample_row(),
        });
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["event"], "new-user-message");
        assert_eq!(json["data"]["sessionId"], "S1");
        assert_eq!(json["data"]["message"]["text"], "hi");
    }

    #[test]
    fn admin_typing_out_is_bare_bool() {
        let json = serde_json::to_value(ServerEvent::AdminTyping(true)).unwrap();
        assert_eq!(json["event"], "admin-typing");
        assert_eq!(json["data"], serde_json::Value::Bool(true));
    }

    #[test]
    fn error_event_shape() {
        let json = serde_json::to_value(ServerEvent::error("Failed to send message")).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["message"], "Failed to send message");
    }

    #[test]
    fn server_event_names_match_wire_form() {
        assert_eq!(ServerEvent::Message(sample_row()).name(), "message");
        assert_eq!(ServerEvent::AdminTyping(false).name(), "admin-typing");
        assert_eq!(ServerEvent::error("x").name(), "error");
    }
}
