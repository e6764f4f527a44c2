//! Push notification type definitions.

use serde::{Deserialize, Serialize};

/// Notification to deliver to a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushNotification {
    /// Alert title.
    pub title: String,
    /// Alert body.
    pub body: String,
    /// Sound name (e.g., "default").
    pub sound: Option<String>,
    /// Thread ID for notification grouping (the session id).
    pub thread_id: Option<String>,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSendResult {
    /// Whether the delivery succeeded.
    pub success: bool,
    /// HTTP status code, when the request reached the service.
    pub status_code: Option<u16>,
    /// APNs-assigned notification ID (on success).
    pub apns_id: Option<String>,
    /// Error reason from the service (e.g. `Unregistered`).
    pub reason: Option<String>,
    /// Error message.
    pub error: Option<String>,
}

impl PushSendResult {
    /// A failure that never reached the delivery service.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: None,
            apns_id: None,
            reason: None,
            error: Some(error.into()),
        }
    }
}
