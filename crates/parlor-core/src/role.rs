//! Sender role vocabulary shared by the relay, the store, and the wire protocol.
//!
//! Exactly two parties can author a message: the anonymous visitor (`user`)
//! and the shared support console (`admin`). The enum is closed — every
//! branch point (greeting injection, admin-room fan-out, notification
//! trigger) matches exhaustively, and unknown role strings are rejected
//! before anything is persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who authored a chat message.
///
/// Serialized as lowercase (`"user"` / `"admin"`) everywhere it appears:
/// wire payloads, database rows, and log fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    /// The anonymous visitor side of a conversation.
    User,
    /// The shared support console.
    Admin,
}

impl SenderRole {
    /// Canonical lowercase form, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is neither `"user"` nor `"admin"`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid sender role: {0:?}")]
pub struct InvalidRole(pub String);

impl FromStr for SenderRole {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
