//! Row structs returned by the repositories.
//!
//! [`MessageRow`] doubles as the wire object: the relay broadcasts the
//! persisted row verbatim, so its serde form (camelCase keys, absent
//! optionals omitted) is the JSON clients see.

use parlor_core::role::SenderRole;
use serde::{Deserialize, Serialize};

/// A persisted chat message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    /// Server-assigned sequence identity (`AUTOINCREMENT`).
    pub id: i64,
    /// Opaque client-supplied session id.
    pub session_id: String,
    /// Who authored the message.
    pub sender_role: SenderRole,
    /// Message text. May be empty when an image is attached.
    pub text: String,
    /// Optional image payload reference (data URL or upload key).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    /// Display name the sender supplied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Text of the message this one replies to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Server-assigned creation time, RFC 3339 UTC.
    pub created_at: String,
}

/// Fields of a message about to be inserted.
///
/// Timestamp and id are assigned by the store, never by the caller.
#[derive(Debug, Clone, Copy)]
pub struct NewMessage<'a> {
    /// Session the message belongs to.
    pub session_id: &'a str,
    /// Authoring role.
    pub sender_role: SenderRole,
    /// Message text.
    pub text: &'a str,
    /// Optional image payload reference.
    pub image_data: Option<&'a str>,
    /// Optional sender display name.
    pub display_name: Option<&'a str>,
    /// Optional quoted-message text.
    pub reply_to: Option<&'a str>,
}

impl<'a> NewMessage<'a> {
    /// A plain text message with no optional attributes.
    pub fn text_only(session_id: &'a str, sender_role: SenderRole, text: &'a str) -> Self {
        Self {
            session_id,
            sender_role,
            text,
            image_data: None,
            display_name: None,
            reply_to: None,
        }
    }
}

/// One session in the admin console's session list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Opaque session id.
    pub session_id: String,
    /// RFC 3339 timestamp of the most recent message.
    pub last_message: String,
    /// Most recent non-null display name seen on the session's messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A session's registered device token.
#[derive(Clone, Debug, PartialEq)]
pub struct PushTokenRow {
    /// Session the token belongs to.
    pub session_id: String,
    /// Opaque device token.
    pub token: String,
    /// RFC 3339 timestamp of the last registration write.
    pub updated_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
