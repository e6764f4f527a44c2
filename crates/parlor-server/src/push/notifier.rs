//! Best-effort push dispatch for admin replies.
//!
//! [`PushNotifier::notify`] runs strictly after the relay's own result is
//! decided: its latency and failures are invisible to the sender. Failures
//! are logged and counted, never retried and never escalated.
//!
//! Delivery goes through the [`PushDelegate`] seam so the relay can be
//! exercised without Apple's servers: [`ApnsPushDelegate`] wraps the real
//! service, [`DisabledPushDelegate`] stands in when no credentials are
//! configured.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use parlor_store::ChatStore;
use tracing::{debug, info, instrument, warn};

use super::service::ApnsService;
use super::types::{PushNotification, PushSendResult};
use crate::metrics::{PUSH_ATTEMPTS_TOTAL, PUSH_FAILURES_TOTAL};

/// Fixed alert title for admin replies.
pub const NOTIFICATION_TITLE: &str = "New message";

/// Alert body used when the message carries only an image.
pub const IMAGE_BODY: &str = "Sent an image";

/// Delivery backend for push notifications.
#[async_trait]
pub trait PushDelegate: Send + Sync {
    /// Deliver one notification to one device.
    async fn deliver(&self, device_token: &str, notification: &PushNotification)
    -> PushSendResult;
}

/// Real delegate backed by [`ApnsService`].
pub struct ApnsPushDelegate {
    apns: Arc<ApnsService>,
}

impl ApnsPushDelegate {
    /// Wrap an APNs service.
    pub fn new(apns: Arc<ApnsService>) -> Self {
        Self { apns }
    }
}

#[async_trait]
impl PushDelegate for ApnsPushDelegate {
    async fn deliver(
        &self,
        device_token: &str,
        notification: &PushNotification,
    ) -> PushSendResult {
        self.apns.send(device_token, notification).await
    }
}

/// Fallback delegate used when APNs credentials are not configured.
pub struct DisabledPushDelegate;

#[async_trait]
impl PushDelegate for DisabledPushDelegate {
    async fn deliver(
        &self,
        _device_token: &str,
        _notification: &PushNotification,
    ) -> PushSendResult {
        debug!("push delivery disabled, dropping notification");
        PushSendResult::failure("push delivery disabled")
    }
}

/// Looks up a session's registered token and dispatches one delivery.
pub struct PushNotifier {
    store: Arc<ChatStore>,
    delegate: Arc<dyn PushDelegate>,
}

impl PushNotifier {
    /// Create a notifier over the store and a delivery delegate.
    pub fn new(store: Arc<ChatStore>, delegate: Arc<dyn PushDelegate>) -> Self {
        Self { store, delegate }
    }

    /// Notify the session's registered device about an admin reply.
    ///
    /// No-op when the session has no registered token. A 410 response
    /// (`Unregistered`) clears the dead registration so later sends skip
    /// the attempt entirely.
    #[instrument(skip(self, text, has_image))]
    pub async fn notify(&self, session_id: &str, text: &str, has_image: bool) {
        let token = match self.store.push_token(session_id) {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no push token registered, skipping notification");
                return;
            }
            Err(e) => {
                warn!(error = %e, "push token lookup failed");
                return;
            }
        };

        counter!(PUSH_ATTEMPTS_TOTAL).increment(1);

        let body = if text.is_empty() && has_image {
            IMAGE_BODY
        } else {
            text
        };
        let notification = PushNotification {
            title: NOTIFICATION_TITLE.to_string(),
            body: body.to_string(),
            sound: Some("default".to_string()),
            thread_id: Some(session_id.to_string()),
        };

        let result = self.delegate.deliver(&token, &notification).await;

        if result.success {
            info!(status = ?result.status_code, apns_id = ?result.apns_id, "push notification delivered");
        } else {
            counter!(PUSH_FAILURES_TOTAL).increment(1);
            warn!(
                status = ?result.status_code,
                reason = ?result.reason,
                error = ?result.error,
                "push notification failed"
            );
            if result.status_code == Some(410) {
                match self.store.clear_push_token(session_id) {
                    Ok(cleared) => debug!(cleared, "cleared expired push token"),
                    Err(e) => warn!(error = %e, "failed to clear expired push token"),
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
